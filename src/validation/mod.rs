//! Human-in-the-loop review of extracted tuples.
//!
//! Every stored tuple starts `pending` and moves at most once to
//! `validated`, `corrected` or `rejected`. The first two create exactly one
//! Person/Sacrament pair; `rejected` creates nothing. `cancel` resets a
//! whole page. Page completion is derived from tuple states, never stored.

mod machine;
mod record;
mod store;

pub use machine::{PageStatus, ValidationMachine, ValidationOutcome};
pub use record::{PersonKey, Submission};
pub use store::{LedgerStore, StoredTuple};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review state of a tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    Pending,
    Validated,
    Corrected,
    Rejected,
}

impl Estado {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Corrected => "corrected",
            Self::Rejected => "rejected",
        }
    }

    /// No further transition without a page cancel.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Terminal states that own a Person/Sacrament pair.
    pub fn creates_records(self) -> bool {
        matches!(self, Self::Validated | Self::Corrected)
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estado {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "validated" => Ok(Self::Validated),
            "corrected" => Ok(Self::Corrected),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown estado '{other}'")),
        }
    }
}

impl ToSql for Estado {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Estado {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

//! Error taxonomy surfaced to callers of the pipeline and the validation
//! state machine.
//!
//! Per-cell recognition failures never show up here: the extraction engine
//! absorbs them into empty candidates (see [`crate::recognize::RecognizeError`]).
//! Only grid-level failures, data-integrity conflicts and caller errors
//! propagate.

use crate::validation::Estado;
use thiserror::Error;

/// Convenient result alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The table grid could not be recovered, even with the proportional
    /// fallback. Fatal for the page; no tuples are produced.
    #[error("table structure could not be recovered: {reason}")]
    StructureDetectionFailure { reason: String },

    /// A person with the same identity key already exists. The transition
    /// was aborted and the tuple is still pending.
    #[error("person already registered with id {person_id}")]
    DuplicatePersonConflict { person_id: i64 },

    /// The reviewer's submission was rejected before any mutation.
    #[error("invalid correction payload ({field}): {reason}")]
    InvalidCorrectionPayload { field: String, reason: String },

    #[error("tuple {0} does not exist")]
    TupleNotFound(i64),

    /// A terminal tuple cannot transition again until the page is cancelled.
    #[error("tuple {tuple_id} is already {estado}")]
    TupleAlreadyFinal { tuple_id: i64, estado: Estado },

    /// The page is currently being processed by another worker.
    #[error("page {0} is already being processed")]
    PageBusy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn structure(reason: impl Into<String>) -> Self {
        Self::StructureDetectionFailure {
            reason: reason.into(),
        }
    }

    pub fn payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCorrectionPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the operator should see as a page-level failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructureDetectionFailure { .. })
    }
}

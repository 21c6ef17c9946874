//! Column layouts of the supported registers.
//!
//! A layout names the role of every column of a ledger page and its
//! approximate relative width. Roles drive the OCR configuration of a cell,
//! the normalizer branch and the mapping of a validated row onto person and
//! sacrament fields; widths feed the proportional column fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SacramentKind {
    Baptism,
    Confirmation,
    Marriage,
}

impl SacramentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baptism => "baptism",
            Self::Confirmation => "confirmation",
            Self::Marriage => "marriage",
        }
    }
}

impl fmt::Display for SacramentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SacramentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baptism" => Ok(Self::Baptism),
            "confirmation" => Ok(Self::Confirmation),
            "marriage" => Ok(Self::Marriage),
            other => Err(format!("unknown sacrament kind '{other}'")),
        }
    }
}

/// Meaning of a ledger column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    GivenNames,
    PaternalSurname,
    MaternalSurname,
    BirthDay,
    BirthMonth,
    BirthYear,
    SacramentDay,
    SacramentMonth,
    SacramentYear,
    BaptismDay,
    BaptismMonth,
    BaptismYear,
    BirthPlace,
    Father,
    Mother,
    Godparents,
    Minister,
    Spouse,
    Notes,
}

impl FieldRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GivenNames => "given_names",
            Self::PaternalSurname => "paternal_surname",
            Self::MaternalSurname => "maternal_surname",
            Self::BirthDay => "birth_day",
            Self::BirthMonth => "birth_month",
            Self::BirthYear => "birth_year",
            Self::SacramentDay => "sacrament_day",
            Self::SacramentMonth => "sacrament_month",
            Self::SacramentYear => "sacrament_year",
            Self::BaptismDay => "baptism_day",
            Self::BaptismMonth => "baptism_month",
            Self::BaptismYear => "baptism_year",
            Self::BirthPlace => "birth_place",
            Self::Father => "father",
            Self::Mother => "mother",
            Self::Godparents => "godparents",
            Self::Minister => "minister",
            Self::Spouse => "spouse",
            Self::Notes => "notes",
        }
    }

    /// Day, month and year columns hold digits only.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::BirthDay
                | Self::BirthMonth
                | Self::BirthYear
                | Self::SacramentDay
                | Self::SacramentMonth
                | Self::SacramentYear
                | Self::BaptismDay
                | Self::BaptismMonth
                | Self::BaptismYear
        )
    }

    pub fn is_person_name(self) -> bool {
        matches!(
            self,
            Self::GivenNames
                | Self::PaternalSurname
                | Self::MaternalSurname
                | Self::Father
                | Self::Mother
                | Self::Godparents
                | Self::Minister
                | Self::Spouse
        )
    }

    pub fn is_place(self) -> bool {
        matches!(self, Self::BirthPlace)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub role: FieldRole,
    /// Approximate share of the page width.
    pub width_ratio: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub kind: SacramentKind,
    pub columns: Vec<ColumnSpec>,
}

impl ColumnLayout {
    /// Built-in ten-column layout for `kind`.
    pub fn preset(kind: SacramentKind) -> Self {
        use FieldRole::*;
        let columns: &[(FieldRole, f32)] = match kind {
            SacramentKind::Baptism => &[
                (GivenNames, 0.16),
                (PaternalSurname, 0.13),
                (MaternalSurname, 0.13),
                (BirthDay, 0.05),
                (BirthMonth, 0.05),
                (BirthYear, 0.07),
                (SacramentDay, 0.05),
                (SacramentMonth, 0.05),
                (SacramentYear, 0.07),
                (BirthPlace, 0.24),
            ],
            SacramentKind::Confirmation => &[
                (GivenNames, 0.16),
                (PaternalSurname, 0.13),
                (MaternalSurname, 0.13),
                (BaptismDay, 0.05),
                (BaptismMonth, 0.05),
                (BaptismYear, 0.07),
                (SacramentDay, 0.05),
                (SacramentMonth, 0.05),
                (SacramentYear, 0.07),
                (Godparents, 0.24),
            ],
            SacramentKind::Marriage => &[
                (GivenNames, 0.15),
                (PaternalSurname, 0.12),
                (MaternalSurname, 0.12),
                (BirthDay, 0.05),
                (BirthMonth, 0.05),
                (BirthYear, 0.07),
                (SacramentDay, 0.05),
                (SacramentMonth, 0.05),
                (SacramentYear, 0.07),
                (Spouse, 0.27),
            ],
        };
        Self {
            kind,
            columns: columns
                .iter()
                .map(|&(role, width_ratio)| ColumnSpec { role, width_ratio })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn role(&self, column: usize) -> Option<FieldRole> {
        self.columns.get(column).map(|c| c.role)
    }

    /// Index of the first column holding `role`.
    pub fn position(&self, role: FieldRole) -> Option<usize> {
        self.columns.iter().position(|c| c.role == role)
    }

    pub fn width_ratios(&self) -> Vec<f32> {
        self.columns.iter().map(|c| c.width_ratio).collect()
    }

    /// Layout usable for a page with `columns` columns, if widths match.
    pub fn for_columns(&self, columns: usize) -> Option<&Self> {
        (self.columns.len() == columns).then_some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_the_page_width() {
        for kind in [
            SacramentKind::Baptism,
            SacramentKind::Confirmation,
            SacramentKind::Marriage,
        ] {
            let layout = ColumnLayout::preset(kind);
            assert_eq!(layout.len(), 10);
            let total: f32 = layout.width_ratios().iter().sum();
            assert!((total - 1.0).abs() < 1e-3, "{kind}: {total}");
            assert!(layout.position(FieldRole::GivenNames).is_some());
            assert!(layout.position(FieldRole::SacramentYear).is_some());
        }
    }

    #[test]
    fn kind_round_trips_through_str() {
        assert_eq!("confirmation".parse(), Ok(SacramentKind::Confirmation));
        assert!("burial".parse::<SacramentKind>().is_err());
    }
}

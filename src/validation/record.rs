use crate::error::{LedgerError, Result};
use crate::layout::{ColumnLayout, FieldRole, SacramentKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reviewer decision for one tuple: the cell values as they should be
/// recorded. Identical to the stored cells means "validated as extracted".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub institution_id: i64,
    pub reviewer_id: i64,
    pub cells: Vec<String>,
}

/// Identity of a person. Missing dates are empty strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PersonKey {
    pub given_names: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    /// `YYYY-MM-DD` or empty.
    pub birth_date: String,
    /// `YYYY-MM-DD` or empty.
    pub baptism_date: String,
}

/// A submission mapped onto the domain records it will create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DomainRecord {
    pub person: PersonKey,
    pub birth_place: String,
    pub sacrament_date: String,
    /// Remaining non-empty fields by role name.
    pub details: BTreeMap<&'static str, String>,
}

const BIRTH: [FieldRole; 3] = [FieldRole::BirthDay, FieldRole::BirthMonth, FieldRole::BirthYear];
const BAPTISM: [FieldRole; 3] = [FieldRole::BaptismDay, FieldRole::BaptismMonth, FieldRole::BaptismYear];
const SACRAMENT: [FieldRole; 3] = [
    FieldRole::SacramentDay,
    FieldRole::SacramentMonth,
    FieldRole::SacramentYear,
];

impl Submission {
    /// Check the payload against `layout` and map it onto domain fields.
    /// Runs before any mutation.
    pub(crate) fn to_record(&self, layout: &ColumnLayout) -> Result<DomainRecord> {
        if self.institution_id <= 0 {
            return Err(LedgerError::payload("institution_id", "must be positive"));
        }
        if self.reviewer_id <= 0 {
            return Err(LedgerError::payload("reviewer_id", "must be positive"));
        }
        if self.cells.len() != layout.len() {
            return Err(LedgerError::payload(
                "cells",
                format!("expected {} cells, got {}", layout.len(), self.cells.len()),
            ));
        }

        let field = |role: FieldRole| -> String {
            layout
                .position(role)
                .map(|i| self.cells[i].trim().to_string())
                .unwrap_or_default()
        };
        let required = |role: FieldRole| -> Result<String> {
            let value = field(role);
            if value.is_empty() {
                return Err(LedgerError::payload(role.as_str(), "required"));
            }
            Ok(value)
        };

        let given_names = required(FieldRole::GivenNames)?;
        let paternal_surname = required(FieldRole::PaternalSurname)?;
        let birth_date = date_field(layout, &self.cells, BIRTH, "birth_date")?;
        let sacrament_date = date_field(layout, &self.cells, SACRAMENT, "sacrament_date")?;
        let baptism_date = if layout.position(FieldRole::BaptismYear).is_some() {
            date_field(layout, &self.cells, BAPTISM, "baptism_date")?
        } else if layout.kind == SacramentKind::Baptism {
            sacrament_date.clone()
        } else {
            String::new()
        };

        let consumed = [
            FieldRole::GivenNames,
            FieldRole::PaternalSurname,
            FieldRole::MaternalSurname,
            FieldRole::BirthPlace,
        ];
        let details = layout
            .columns
            .iter()
            .zip(&self.cells)
            .filter(|(column, value)| {
                !consumed.contains(&column.role)
                    && !column.role.is_numeric()
                    && !value.trim().is_empty()
            })
            .map(|(column, value)| (column.role.as_str(), value.trim().to_string()))
            .collect();

        Ok(DomainRecord {
            person: PersonKey {
                given_names,
                paternal_surname,
                maternal_surname: field(FieldRole::MaternalSurname),
                birth_date,
                baptism_date,
            },
            birth_place: field(FieldRole::BirthPlace),
            sacrament_date,
            details,
        })
    }
}

/// Day/month/year triple as `YYYY-MM-DD`: all blank gives "", anything else
/// must be a real calendar date. Layouts without the triple give "".
fn date_field(
    layout: &ColumnLayout,
    cells: &[String],
    roles: [FieldRole; 3],
    name: &str,
) -> Result<String> {
    let mut parts = [""; 3];
    for (part, role) in parts.iter_mut().zip(roles) {
        if let Some(i) = layout.position(role) {
            *part = cells[i].trim();
        }
    }
    if parts.iter().all(|p| p.is_empty()) {
        return Ok(String::new());
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(LedgerError::payload(name, "incomplete date"));
    }
    let number = |s: &str| -> Result<u32> {
        s.parse::<u32>()
            .map_err(|_| LedgerError::payload(name, format!("'{s}' is not a number")))
    };
    let (day, month, year) = (number(parts[0])?, number(parts[1])?, number(parts[2])?);
    let date = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or_else(|| LedgerError::payload(name, format!("{day}/{month}/{year} is not a calendar date")))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

use super::store::{self, LedgerStore};
use super::{Estado, Submission};
use crate::error::{LedgerError, Result};
use crate::layout::{ColumnLayout, SacramentKind};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub tuple_id: i64,
    pub estado: Estado,
    pub person_id: Option<i64>,
    pub sacrament_id: Option<i64>,
    /// Lowest pending row left on the page, if any.
    pub next_pending_row: Option<usize>,
}

/// Derived review status of a page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatus {
    pub pending: usize,
    pub validated: usize,
    pub corrected: usize,
    pub rejected: usize,
}

impl PageStatus {
    pub fn total(&self) -> usize {
        self.pending + self.validated + self.corrected + self.rejected
    }

    /// Every tuple is terminal. Vacuously true for a page without tuples.
    pub fn completed(&self) -> bool {
        self.pending == 0
    }
}

/// Tuple review state machine over a [`LedgerStore`].
pub struct ValidationMachine {
    store: Arc<LedgerStore>,
    layouts: Vec<ColumnLayout>,
}

impl ValidationMachine {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            layouts: Vec::new(),
        }
    }

    /// Layouts overriding the built-in presets.
    pub fn with_layouts(mut self, layouts: Vec<ColumnLayout>) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    fn layout(&self, kind: SacramentKind, columns: usize) -> Result<ColumnLayout> {
        let layout = self
            .layouts
            .iter()
            .find(|l| l.kind == kind)
            .cloned()
            .unwrap_or_else(|| ColumnLayout::preset(kind));
        if layout.len() != columns {
            return Err(LedgerError::payload(
                "cells",
                format!("no {kind} layout with {columns} columns"),
            ));
        }
        Ok(layout)
    }

    /// Accept a tuple, as extracted (`validated`) or with corrections
    /// (`corrected`), creating its Person and Sacrament.
    ///
    /// Fails without mutating anything on an invalid payload, on a tuple that
    /// is no longer pending, and on a person identity that already exists
    /// (`DuplicatePersonConflict` carries the existing person's id).
    pub fn validate(&self, tuple_id: i64, submission: &Submission) -> Result<ValidationOutcome> {
        let cells: Vec<String> = submission.cells.iter().map(|c| c.trim().to_string()).collect();
        let submission = Submission {
            cells,
            ..submission.clone()
        };

        self.store.immediate(|tx| {
            let tuple = store::load_tuple(tx, tuple_id)?;
            if tuple.estado.is_terminal() {
                return Err(LedgerError::TupleAlreadyFinal {
                    tuple_id,
                    estado: tuple.estado,
                });
            }
            let layout = self.layout(tuple.sacrament, tuple.columns)?;
            let record = submission.to_record(&layout)?;

            if let Some(person_id) = store::find_person(tx, &record.person)? {
                warn!(
                    "ValidationMachine::validate tuple={tuple_id} conflicts with person {person_id}"
                );
                return Err(LedgerError::DuplicatePersonConflict { person_id });
            }

            let estado = if submission.cells == tuple.extracted {
                Estado::Validated
            } else {
                Estado::Corrected
            };
            let (person_id, sacrament_id) = store::insert_records(
                tx,
                &tuple,
                &record,
                submission.institution_id,
                submission.reviewer_id,
            )?;
            let moved = store::finish_tuple(
                tx,
                tuple_id,
                estado,
                &submission.cells,
                Some(submission.institution_id),
                submission.reviewer_id,
            )?;
            if !moved {
                // Rolled back with the transaction.
                return Err(LedgerError::TupleAlreadyFinal {
                    tuple_id,
                    estado: tuple.estado,
                });
            }
            let next_pending_row = store::next_pending_row(tx, &tuple.page_id)?;
            info!(
                "ValidationMachine::validate tuple={tuple_id} page={} {estado} person={person_id} sacrament={sacrament_id}",
                tuple.page_id
            );
            Ok(ValidationOutcome {
                tuple_id,
                estado,
                person_id: Some(person_id),
                sacrament_id: Some(sacrament_id),
                next_pending_row,
            })
        })
    }

    /// Mark a pending tuple `rejected`; no records are created.
    pub fn reject(&self, tuple_id: i64, reviewer_id: i64) -> Result<ValidationOutcome> {
        if reviewer_id <= 0 {
            return Err(LedgerError::payload("reviewer_id", "must be positive"));
        }
        self.store.immediate(|tx| {
            let tuple = store::load_tuple(tx, tuple_id)?;
            let moved = store::finish_tuple(tx, tuple_id, Estado::Rejected, &tuple.cells, None, reviewer_id)?;
            if !moved {
                return Err(LedgerError::TupleAlreadyFinal {
                    tuple_id,
                    estado: tuple.estado,
                });
            }
            info!("ValidationMachine::reject tuple={tuple_id} page={}", tuple.page_id);
            Ok(ValidationOutcome {
                tuple_id,
                estado: Estado::Rejected,
                person_id: None,
                sacrament_id: None,
                next_pending_row: store::next_pending_row(tx, &tuple.page_id)?,
            })
        })
    }

    /// Force every tuple of the page back to `pending`, deleting the
    /// records its reviews created. Returns how many tuples were reset.
    pub fn cancel(&self, page_id: &str) -> Result<usize> {
        let reset = self.store.immediate(|tx| store::reset_page(tx, page_id))?;
        info!("ValidationMachine::cancel page={page_id} reset={reset}");
        Ok(reset)
    }

    pub fn page_status(&self, page_id: &str) -> Result<PageStatus> {
        let counts = self
            .store
            .estado_counts(page_id)?
            .ok_or_else(|| LedgerError::InvalidInput(format!("unknown page {page_id}")))?;
        let mut status = PageStatus::default();
        for (estado, n) in counts {
            match estado {
                Estado::Pending => status.pending = n,
                Estado::Validated => status.validated = n,
                Estado::Corrected => status.corrected = n,
                Estado::Rejected => status.rejected = n,
            }
        }
        Ok(status)
    }

    /// True iff every tuple of the page is terminal.
    pub fn completed(&self, page_id: &str) -> Result<bool> {
        Ok(self.page_status(page_id)?.completed())
    }
}

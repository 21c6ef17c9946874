use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Coarse "cells processed / total cells" counter, safe to poll from any
/// thread. Both counts only grow; totals accumulate across pages.
#[derive(Debug, Default)]
pub struct Progress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    /// Completed share in `[0, 1]`; 0 before any work is announced.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f32 / self.total as f32).min(1.0)
        }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_total(&self, cells: usize) {
        self.total.fetch_add(cells, Ordering::Relaxed);
    }

    pub(crate) fn advance(&self, cells: usize) {
        self.processed.fetch_add(cells, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        // total first so processed never appears ahead of it
        let total = self.total.load(Ordering::Acquire);
        let processed = self.processed.load(Ordering::Acquire);
        ProgressSnapshot {
            processed: processed.min(total),
            total,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.snapshot().fraction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_tracks_work() {
        let p = Progress::new();
        assert_eq!(p.fraction(), 0.0);
        p.add_total(4);
        p.advance(1);
        assert_eq!(p.snapshot(), ProgressSnapshot { processed: 1, total: 4 });
        assert!((p.fraction() - 0.25).abs() < 1e-6);
        p.add_total(4);
        p.advance(7);
        assert_eq!(p.snapshot().processed, 8);
        assert_eq!(p.fraction(), 1.0);
    }
}

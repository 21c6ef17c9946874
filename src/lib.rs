#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod layout;
pub mod pipeline;
pub mod types;
pub mod validation;

// Stage modules, public for tools and tests.
pub mod binary;
pub mod cells;
pub mod detector;
pub mod enhance;
pub mod grid;
pub mod normalize;
pub mod recognize;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{LedgerError, Result};
pub use crate::layout::{ColumnLayout, FieldRole, SacramentKind};
pub use crate::pipeline::{LedgerParams, PagePipeline, PageRequest, Progress, TupleSink};
pub use crate::types::{CellValue, PageMeta, PageResult, TupleCandidate};
pub use crate::validation::{Estado, LedgerStore, Submission, ValidationMachine, ValidationOutcome};

// Diagnostics returned next to every page.
pub use crate::diagnostics::PageReport;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for embedding the pipeline.
///
/// ```no_run
/// use ledger_reader::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> ledger_reader::Result<()> {
/// let (w, h) = (800usize, 640usize);
/// let gray = vec![255u8; w * h];
///
/// let engine = Arc::new(TesseractCli::locate("spa")?);
/// let extractor = CellExtractor::with_engine(ExtractParams::default(), engine);
/// let pipeline = PagePipeline::new(LedgerParams::default(), extractor, Normalizer::default());
///
/// let result = pipeline.process(&PageRequest {
///     page_id: "libro3-f12".into(),
///     book_id: 3,
///     image: ImageU8 { w, h, stride: w, data: &gray },
///     expected_columns: 10,
///     expected_rows: Some(10),
///     sacrament: SacramentKind::Baptism,
/// })?;
/// println!("{}", result.report.summary());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageU8;
    pub use crate::normalize::Normalizer;
    pub use crate::recognize::{CellExtractor, ExtractParams, TesseractCli, TextRecognizer};
    pub use crate::{
        LedgerParams, LedgerStore, PagePipeline, PageRequest, SacramentKind, Submission,
        ValidationMachine,
    };
}

//! Serializable diagnostics describing one page run.
//!
//! [`PageReport`] is returned next to the extracted tuples; it records what
//! every stage decided (detected vs. fallback geometry, discarded rows,
//! absorbed engine failures) so an operator can decide whether to re-scan.

pub mod page;
pub mod stages;
pub mod timing;

pub use page::{InputDescriptor, PageReport};
pub use stages::{ExtractionStage, GridStage, SegmentStage};
pub use timing::{StageTiming, TimingBreakdown};

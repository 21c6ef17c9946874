//! Binarization and rectangular morphology on page images.
//!
//! The grid detector works on an inverted binary mask (ink = 1) produced by
//! a local-mean adaptive threshold. Ruled separators are isolated with an
//! opening by a long horizontal or tall vertical line element: an opening
//! with a `1 × k` element keeps exactly the foreground runs of length `≥ k`,
//! so it is computed run-wise in a single pass per row/column.

pub mod mask;
pub mod morphology;
pub mod threshold;

pub use mask::BinaryMask;
pub use morphology::{open_horizontal, open_vertical};
pub use threshold::{adaptive_threshold_inv, ThresholdParams};

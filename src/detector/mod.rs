//! Grid detector recovering ledger separators from a grayscale page.
//!
//! Overview
//! - Binarizes the page with an inverted local-mean threshold (ink = 1).
//! - Opens the mask with a wide horizontal element to isolate row rules and a
//!   tall vertical element to isolate column rules.
//! - Rows: raw rule positions are chain-clustered with a minimum separation and
//!   each cluster collapses to its mean.
//! - Columns: clustered candidates are ranked by the foreground mass under
//!   each line. With both table borders drawn, the strongest
//!   `expected_columns + 1` rules are kept and the outer two are the table
//!   borders; page margins outside them fold into the first and last column.
//!   Without borders, rules hugging the page edges merge into the edges and
//!   the strongest `expected_columns - 1` interior rules are kept.
//! - Axes without enough rules fall back to a proportional split (layout
//!   widths or uniform rows) flagged as lossy, or fail when fallback is
//!   disabled or impossible.
//!
//! Modules
//! - [`params`] – knobs of the detector, deserializable from JSON.
//! - `pipeline` – the [`GridDetector`] implementation.

pub mod params;
mod pipeline;

pub use params::{GridParams, GridTarget};
pub use pipeline::{GridDetection, GridDetector};

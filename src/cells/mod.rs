//! Cell segmentation: grid boundaries → ordered rows of cell rectangles.

mod segmenter;
mod types;

pub use segmenter::{CellSegmenter, SegmentParams, Segmentation};
pub use types::{CellImage, CellRect, CellRow};

use crate::image::ImageU8;
use image::GrayImage;
use serde::Serialize;

/// Rectangular cell region `[x1, x2) × [y1, y2)` in page coordinates.
///
/// Invariant: `x1 < x2 <= page_width` and `y1 < y2 <= page_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CellRect {
    pub row: usize,
    pub col: usize,
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl CellRect {
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height().max(1) as f32
    }
}

/// One table row: vertical extent and its cells in column order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellRow {
    pub index: usize,
    pub y1: usize,
    pub y2: usize,
    pub cells: Vec<CellRect>,
}

/// Owned crop of one cell, alive only while the cell is being read.
#[derive(Clone, Debug)]
pub struct CellImage {
    pub rect: CellRect,
    /// Cell width over page width.
    pub width_ratio: f32,
    pub crop: GrayImage,
}

impl CellImage {
    pub fn from_page(page: &ImageU8<'_>, rect: CellRect) -> Self {
        Self {
            rect,
            width_ratio: rect.width() as f32 / page.w.max(1) as f32,
            crop: page.crop(rect.x1, rect.y1, rect.x2, rect.y2),
        }
    }
}

//! Text extraction engine.
//!
//! A [`TextRecognizer`] is any OCR backend able to read one gray crop under an
//! [`OcrConfig`]. The [`CellExtractor`] iterates enhanced variants and
//! configurations through one or more [`Extractor`] strategies, scores every
//! [`Candidate`] and keeps one winner per cell. Recognition failures
//! (engine errors, crashes, timeouts) never escape this module: they become
//! empty candidates, because a blank cell is a legitimate ledger value.

mod extractor;
mod guard;
pub mod tesseract;

pub use extractor::{
    CellExtractor, CellOutcome, CellRole, EngineExtractor, ExtractParams, Extraction, Extractor,
};
pub use guard::GuardedRecognizer;
pub use tesseract::TesseractCli;

use crate::enhance::VariantKind;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Character class a configuration targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    Numeric,
    FreeText,
}

/// Engine configuration for one recognition pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    pub name: String,
    pub mode: OcrMode,
    /// Page segmentation mode hint (tesseract numbering).
    pub psm: u8,
    /// Restrict output to these characters, when the engine supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
}

impl OcrConfig {
    pub fn numeric(name: &str, psm: u8) -> Self {
        Self {
            name: name.to_string(),
            mode: OcrMode::Numeric,
            psm,
            whitelist: Some("0123456789".to_string()),
        }
    }

    pub fn free_text(name: &str, psm: u8) -> Self {
        Self {
            name: name.to_string(),
            mode: OcrMode::FreeText,
            psm,
            whitelist: None,
        }
    }
}

/// Failure of a single recognition call. Always absorbed by the extractor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecognizeError {
    #[error("engine timed out after {ms} ms")]
    Timeout { ms: u64 },
    #[error("engine error: {0}")]
    Engine(String),
    #[error("engine crashed")]
    Crashed,
}

/// An OCR backend.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String, RecognizeError>;

    /// Like [`recognize`](Self::recognize), but the engine must stop its
    /// work once `deadline` passes. Engines running an external process
    /// override this to kill it; in-process engines keep the default.
    fn recognize_until(
        &self,
        image: &GrayImage,
        config: &OcrConfig,
        deadline: Instant,
    ) -> Result<String, RecognizeError> {
        let _ = deadline;
        self.recognize(image, config)
    }
}

/// One recognition result for a cell under a (variant, config) pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub confidence: f32,
    pub variant: VariantKind,
    pub engine: String,
    pub config: String,
    #[serde(skip)]
    pub failure: Option<RecognizeError>,
}

impl Candidate {
    /// Empty candidate recording why nothing was read.
    pub fn empty(variant: VariantKind, engine: &str, config: &str, failure: Option<RecognizeError>) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            variant,
            engine: engine.to_string(),
            config: config.to_string(),
            failure,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

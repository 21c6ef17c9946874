use image::GrayImage;
use ledger_reader::recognize::{OcrConfig, OcrMode, RecognizeError, TextRecognizer};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reads "12" (numeric) or "MARIA" (free text) from any crop that holds a
/// dark pixel, and nothing from clean paper.
#[derive(Default)]
pub struct InkSpotter {
    pub calls: AtomicUsize,
}

impl TextRecognizer for InkSpotter {
    fn name(&self) -> &str {
        "ink-spotter"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String, RecognizeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !image.pixels().any(|p| p.0[0] < 128) {
            return Ok(String::new());
        }
        Ok(match config.mode {
            OcrMode::Numeric => "12".to_string(),
            OcrMode::FreeText => "MARIA".to_string(),
        })
    }
}

/// Always fails, like an engine fed a corrupt buffer.
pub struct Broken;

impl TextRecognizer for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize(&self, _: &GrayImage, _: &OcrConfig) -> Result<String, RecognizeError> {
        Err(RecognizeError::Engine("corrupt buffer".to_string()))
    }
}

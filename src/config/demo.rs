use crate::error::{LedgerError, Result};
use crate::layout::SacramentKind;
use crate::normalize::DictionaryFiles;
use crate::pipeline::LedgerParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl OutputFormat {
    pub fn includes_text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub json_out: Option<PathBuf>,
    /// SQLite file receiving the page's pending tuples.
    pub database: Option<PathBuf>,
}

/// Recognition engine selection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tesseract language code(s), e.g. `spa` or `spa+lat`.
    pub lang: String,
    /// Explicit engine binary; looked up on `PATH` when absent.
    pub binary: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lang: "spa".to_string(),
            binary: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DemoConfig {
    pub input: PathBuf,
    /// Defaults to the input file stem.
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default = "default_book_id")]
    pub book_id: i64,
    pub sacrament: SacramentKind,
    #[serde(default = "default_columns")]
    pub expected_columns: usize,
    #[serde(default)]
    pub expected_rows: Option<usize>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub dictionary: DictionaryFiles,
    #[serde(default)]
    pub params: LedgerParams,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_book_id() -> i64 {
    1
}

fn default_columns() -> usize {
    10
}

impl DemoConfig {
    pub fn page_id(&self) -> String {
        self.page_id.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "page".to_string())
        })
    }
}

pub fn load_config(path: &Path) -> Result<DemoConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| LedgerError::Config(format!("Failed to read config {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| LedgerError::Config(format!("Failed to parse config {}: {e}", path.display())))
}

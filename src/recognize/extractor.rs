use super::{Candidate, GuardedRecognizer, OcrConfig, RecognizeError, TextRecognizer};
use crate::enhance::Variant;
use crate::layout::FieldRole;
use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Expected content of a cell, which picks the configuration list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRole {
    Numeric,
    FreeText,
}

impl CellRole {
    /// The layout role wins; without one, narrow cells are numeric.
    pub fn estimate(role: Option<FieldRole>, width_ratio: f32, numeric_width_ratio: f32) -> Self {
        match role {
            Some(role) if role.is_numeric() => Self::Numeric,
            Some(_) => Self::FreeText,
            None if width_ratio < numeric_width_ratio => Self::Numeric,
            None => Self::FreeText,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOutcome {
    Recognized,
    /// Every attempt read nothing. A legitimate blank ledger field.
    Blank,
    /// No variants: crop below the minimum usable size.
    Skipped,
    /// Every attempt errored or timed out.
    Failed,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    /// Cells narrower than this share of the page width read as numeric when
    /// the layout does not say otherwise.
    pub numeric_width_ratio: f32,
    /// Length and alphanumeric counts saturate at this many characters.
    pub length_cap: usize,
    /// A result of at least this many characters from the top-priority
    /// variant is accepted without trying anything else.
    pub accept_len: usize,
    /// Stop once a candidate scores at or above this confidence.
    pub high_confidence: f32,
    /// Per-call engine timeout. Zero disables the worker-thread guard.
    pub engine_timeout_ms: u64,
    pub numeric_configs: Vec<OcrConfig>,
    pub text_configs: Vec<OcrConfig>,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            numeric_width_ratio: 0.06,
            length_cap: 12,
            accept_len: 2,
            high_confidence: 0.85,
            engine_timeout_ms: 8_000,
            numeric_configs: vec![
                OcrConfig::numeric("digits-line", 7),
                OcrConfig::numeric("digits-word", 8),
            ],
            text_configs: vec![
                OcrConfig::free_text("text-line", 7),
                OcrConfig::free_text("text-block", 6),
            ],
        }
    }
}

impl ExtractParams {
    pub fn timeout(&self) -> Option<Duration> {
        (self.engine_timeout_ms > 0).then(|| Duration::from_millis(self.engine_timeout_ms))
    }

    pub fn configs(&self, role: CellRole) -> &[OcrConfig] {
        match role {
            CellRole::Numeric => &self.numeric_configs,
            CellRole::FreeText => &self.text_configs,
        }
    }

    /// Confidence of `text` read from a variant of weight `weight`.
    pub fn score(&self, text: &str, weight: f32) -> f32 {
        if self.length_cap == 0 {
            return 0.0;
        }
        let cap = self.length_cap;
        let len = text.chars().count().min(cap);
        let alnum = text.chars().filter(|c| c.is_alphanumeric()).count().min(cap);
        weight * (len + alnum) as f32 / (2 * cap) as f32
    }
}

/// One recognition strategy, tried for every (variant, config) pair.
///
/// Implementations never fail: errors come back as an empty [`Candidate`]
/// carrying the failure. Confidence is assigned by the [`CellExtractor`].
pub trait Extractor: Send + Sync {
    fn attempt(&self, variant: &Variant, config: &OcrConfig) -> Candidate;
}

/// [`Extractor`] backed by a guarded [`TextRecognizer`].
#[derive(Clone, Debug)]
pub struct EngineExtractor {
    engine: GuardedRecognizer,
}

impl EngineExtractor {
    pub fn new(engine: Arc<dyn TextRecognizer>, timeout: Option<Duration>) -> Self {
        Self {
            engine: GuardedRecognizer::new(engine, timeout),
        }
    }
}

impl Extractor for EngineExtractor {
    fn attempt(&self, variant: &Variant, config: &OcrConfig) -> Candidate {
        match self.engine.recognize(&variant.image, config) {
            Ok(raw) => Candidate {
                text: raw.trim().to_string(),
                confidence: 0.0,
                variant: variant.kind,
                engine: self.engine.name().to_string(),
                config: config.name.clone(),
                failure: None,
            },
            Err(err) => {
                trace!("{} / {} failed: {err}", self.engine.name(), config.name);
                Candidate::empty(variant.kind, self.engine.name(), &config.name, Some(err))
            }
        }
    }
}

/// Winner for one cell plus bookkeeping for diagnostics.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub best: Option<Candidate>,
    pub outcome: CellOutcome,
    pub attempts: usize,
    pub timeouts: usize,
    pub engine_errors: usize,
    pub short_circuit: bool,
}

impl Extraction {
    fn skipped() -> Self {
        Self {
            best: None,
            outcome: CellOutcome::Skipped,
            attempts: 0,
            timeouts: 0,
            engine_errors: 0,
            short_circuit: false,
        }
    }

    pub fn text(&self) -> &str {
        self.best.as_ref().map_or("", |c| c.text.as_str())
    }

    pub fn confidence(&self) -> f32 {
        self.best.as_ref().map_or(0.0, |c| c.confidence)
    }
}

/// Priority-list scorer over variants, configurations and strategies.
pub struct CellExtractor {
    params: ExtractParams,
    strategies: Vec<Arc<dyn Extractor>>,
}

impl CellExtractor {
    pub fn new(params: ExtractParams, strategies: Vec<Arc<dyn Extractor>>) -> Self {
        Self { params, strategies }
    }

    /// Single engine wrapped in the configured timeout guard.
    pub fn with_engine(params: ExtractParams, engine: Arc<dyn TextRecognizer>) -> Self {
        let strategy = EngineExtractor::new(engine, params.timeout());
        Self::new(params, vec![Arc::new(strategy)])
    }

    pub fn params(&self) -> &ExtractParams {
        &self.params
    }

    /// Pick the best reading of a cell from its variants (priority order).
    pub fn extract(&self, variants: &[Variant], role: CellRole) -> Extraction {
        if variants.is_empty() || self.strategies.is_empty() {
            return Extraction::skipped();
        }
        let p = &self.params;
        let mut out = Extraction {
            best: None,
            outcome: CellOutcome::Blank,
            attempts: 0,
            timeouts: 0,
            engine_errors: 0,
            short_circuit: false,
        };

        'search: for (rank, variant) in variants.iter().enumerate() {
            for config in p.configs(role) {
                for strategy in &self.strategies {
                    let mut cand = strategy.attempt(variant, config);
                    out.attempts += 1;
                    match cand.failure {
                        Some(RecognizeError::Timeout { .. }) => out.timeouts += 1,
                        Some(_) => out.engine_errors += 1,
                        None => {}
                    }
                    if cand.is_empty() {
                        continue;
                    }
                    cand.confidence = p.score(&cand.text, variant.weight);
                    let accept_now = rank == 0 && cand.text.chars().count() >= p.accept_len;
                    let confident = cand.confidence >= p.high_confidence;
                    let better = out
                        .best
                        .as_ref()
                        .map_or(true, |b| cand.confidence > b.confidence);
                    if better {
                        out.best = Some(cand);
                    }
                    if accept_now {
                        out.short_circuit = true;
                        break 'search;
                    }
                    if confident {
                        break 'search;
                    }
                }
            }
        }

        let failures = out.timeouts + out.engine_errors;
        out.outcome = if out.best.is_some() {
            CellOutcome::Recognized
        } else if failures == out.attempts {
            CellOutcome::Failed
        } else {
            CellOutcome::Blank
        };
        out
    }
}

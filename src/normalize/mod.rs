//! Column-aware text normalization.
//!
//! Pure and idempotent: `normalize(normalize(x), k) == normalize(x, k)` for
//! every [`ColumnKind`]. Numeric cells go through a glyph-confusion table and
//! lose everything that is not a digit; name and place cells lose noise
//! symbols and trailing letter runs, are uppercased, and are optionally
//! snapped onto a [`NameDictionary`].

mod dictionary;
mod glyphs;
mod text;

pub use dictionary::{levenshtein_ratio, DictionaryFiles, NameDictionary, WordList};
pub use glyphs::{normalize_numeric, substitute_glyph};
pub use text::{clean_name, normalize_free_text};

use crate::layout::FieldRole;
use serde::{Deserialize, Serialize};

/// Type-specific cleanup branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Name,
    Place,
    FreeText,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NormalizeParams {
    /// Minimum Levenshtein ratio for a dictionary correction.
    pub similarity_threshold: f32,
    /// Tokens shorter than this are never fuzzily corrected.
    pub min_fuzzy_len: usize,
    /// Without a layout role, cells at or below this width/height ratio are
    /// numeric.
    pub numeric_max_aspect: f32,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            min_fuzzy_len: 3,
            numeric_max_aspect: 1.2,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    params: NormalizeParams,
    dictionary: NameDictionary,
}

impl Normalizer {
    pub fn new(params: NormalizeParams, dictionary: NameDictionary) -> Self {
        Self { params, dictionary }
    }

    pub fn params(&self) -> &NormalizeParams {
        &self.params
    }

    pub fn dictionary(&self) -> &NameDictionary {
        &self.dictionary
    }

    /// Expected content type: layout role, then aspect ratio, then digit
    /// majority of the raw text.
    pub fn classify(&self, role: Option<FieldRole>, aspect: Option<f32>, text: &str) -> ColumnKind {
        if let Some(role) = role {
            return if role.is_numeric() {
                ColumnKind::Numeric
            } else if role.is_place() {
                ColumnKind::Place
            } else if role.is_person_name() {
                ColumnKind::Name
            } else {
                ColumnKind::FreeText
            };
        }
        if aspect.is_some_and(|a| a <= self.params.numeric_max_aspect) {
            return ColumnKind::Numeric;
        }
        let digits = text.chars().filter(char::is_ascii_digit).count();
        let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
        if alnum > 0 && digits * 2 > alnum {
            ColumnKind::Numeric
        } else {
            ColumnKind::FreeText
        }
    }

    pub fn normalize(&self, text: &str, kind: ColumnKind) -> String {
        let d = &self.dictionary;
        match kind {
            ColumnKind::Numeric => normalize_numeric(text),
            ColumnKind::Name => self.snap(clean_name(text), &[&d.given_names, &d.surnames]),
            ColumnKind::Place => self.snap(clean_name(text), &[&d.places]),
            ColumnKind::FreeText => normalize_free_text(text),
        }
    }

    /// Classify and normalize one cell, picking the narrowest word list the
    /// role allows.
    pub fn normalize_field(&self, text: &str, role: Option<FieldRole>, aspect: Option<f32>) -> String {
        let kind = self.classify(role, aspect, text);
        let d = &self.dictionary;
        match (kind, role) {
            (ColumnKind::Name, Some(FieldRole::GivenNames)) => {
                self.snap(clean_name(text), &[&d.given_names])
            }
            (ColumnKind::Name, Some(FieldRole::PaternalSurname | FieldRole::MaternalSurname)) => {
                self.snap(clean_name(text), &[&d.surnames])
            }
            _ => self.normalize(text, kind),
        }
    }

    fn snap(&self, cleaned: String, lists: &[&WordList]) -> String {
        if lists.iter().all(|l| l.is_empty()) {
            return cleaned;
        }
        let p = &self.params;
        cleaned
            .split(' ')
            .map(|token| {
                if token.chars().count() < p.min_fuzzy_len || lists.iter().any(|l| l.contains(token)) {
                    return token.to_string();
                }
                lists
                    .iter()
                    .filter_map(|l| l.nearest(token, p.similarity_threshold))
                    .fold(None::<(&str, f32)>, |best, (word, ratio)| match best {
                        Some((_, r)) if r >= ratio => best,
                        _ => Some((word, ratio)),
                    })
                    .map_or_else(|| token.to_string(), |(word, _)| word.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

use super::text::clean_name;
use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// `1 - levenshtein(a, b) / max(len)` over chars; 1.0 for two empty strings.
pub fn levenshtein_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let subst = prev[j] + usize::from(ca != cb);
            cur[j + 1] = subst.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    1.0 - prev[b.len()] as f32 / longest as f32
}

/// Set of cleaned single-word entries.
#[derive(Clone, Debug, Default)]
pub struct WordList {
    words: BTreeSet<String>,
}

impl WordList {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for w in words {
            list.insert(w.as_ref());
        }
        list
    }

    /// Newline-separated list; blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let list = Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        );
        debug!("WordList::from_file {} entries={}", path.display(), list.len());
        Ok(list)
    }

    /// Entries are cleaned and split into words so that every stored word is
    /// a fixed point of [`clean_name`].
    pub fn insert(&mut self, raw: &str) {
        for word in clean_name(raw).split(' ').filter(|w| !w.is_empty()) {
            self.words.insert(word.to_string());
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Most similar entry at or above `threshold`; ties keep the first in
    /// lexical order.
    pub fn nearest(&self, word: &str, threshold: f32) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for entry in &self.words {
            let ratio = levenshtein_ratio(word, entry);
            if ratio >= threshold && best.map_or(true, |(_, r)| ratio > r) {
                best = Some((entry.as_str(), ratio));
            }
        }
        best
    }
}

/// Regional given-name, surname and place lists.
#[derive(Clone, Debug, Default)]
pub struct NameDictionary {
    pub given_names: WordList,
    pub surnames: WordList,
    pub places: WordList,
}

/// Optional list files, one entry per line.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DictionaryFiles {
    pub given_names: Option<PathBuf>,
    pub surnames: Option<PathBuf>,
    pub places: Option<PathBuf>,
}

impl NameDictionary {
    pub fn from_lists<G, S, P>(given_names: G, surnames: S, places: P) -> Self
    where
        G: IntoIterator,
        G::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            given_names: WordList::from_words(given_names),
            surnames: WordList::from_words(surnames),
            places: WordList::from_words(places),
        }
    }

    pub fn load(files: &DictionaryFiles) -> Result<Self> {
        let read = |p: &Option<PathBuf>| -> Result<WordList> {
            p.as_deref().map_or_else(|| Ok(WordList::default()), WordList::from_file)
        };
        Ok(Self {
            given_names: read(&files.given_names)?,
            surnames: read(&files.surnames)?,
            places: read(&files.places)?,
        })
    }
}

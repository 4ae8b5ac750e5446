//! Vocabulary normalization
//!
//! Raw values go through two steps. The pre-filter recognizes values that are
//! already canonical (or can be made canonical without a table) and display
//! artifacts that must be dropped. Everything else is matched against the
//! vocabulary's titles.

use crate::cache::VocabularyCache;
use crate::VocabResult;
use ineosync_core::VocabularyConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Outcome of the pre-filter for one raw value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Checked {
    /// Already a canonical URI; no table lookup needed.
    Canonical(String),
    /// A display artifact, not data.
    Discard,
    /// Needs a table lookup.
    Lookup(String),
}

pub struct Normalizer {
    cache: Arc<VocabularyCache>,
    config: VocabularyConfig,
}

impl Normalizer {
    pub fn new(cache: Arc<VocabularyCache>, config: VocabularyConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &Arc<VocabularyCache> {
        &self.cache
    }

    /// Pre-filter a raw value.
    pub fn check(&self, raw: &str) -> Checked {
        let raw = raw.trim();
        if let Some(expanded) = self.expand_prefix(raw) {
            return Checked::Canonical(expanded);
        }
        if self.config.authorities.iter().any(|base| raw.starts_with(base.as_str())) {
            return Checked::Canonical(raw.to_string());
        }
        if !self.config.display_marker.is_empty() && raw.contains(self.config.display_marker.as_str()) {
            return Checked::Discard;
        }
        Checked::Lookup(raw.to_string())
    }

    fn expand_prefix(&self, raw: &str) -> Option<String> {
        let (prefix, rest) = raw.split_once(':')?;
        if rest.is_empty() || rest.starts_with("//") {
            return None;
        }
        self.config
            .prefixes
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(prefix))
            .map(|(_, base)| format!("{}{}", base, rest))
    }

    /// Match a value against the titles of `vocab`.
    pub fn lookup(&self, vocab: &str, raw: &str) -> VocabResult<Option<String>> {
        let table = self.cache.get(vocab)?;
        if let Some(entry) = table.find_exact(raw) {
            return Ok(Some(entry.canonical_code()));
        }
        if let Some(threshold) = self.config.fuzzy_threshold {
            if let Some(entry) = table.find_fuzzy(raw, threshold) {
                debug!("Fuzzy vocabulary match in '{}': '{}' -> '{}'", vocab, raw, entry.title);
                return Ok(Some(entry.canonical_code()));
            }
        }
        Ok(None)
    }

    /// Normalize one value: canonical code, canonical URI, or absent.
    pub fn normalize(&self, vocab: &str, raw: &str) -> VocabResult<Option<String>> {
        match self.check(raw) {
            Checked::Canonical(uri) => Ok(Some(uri)),
            Checked::Discard => Ok(None),
            Checked::Lookup(value) => self.lookup(vocab, &value),
        }
    }

    /// Normalize every value and collect the distinct results. An empty set is absent.
    pub fn normalize_all<'a, I>(&self, vocab: &str, values: I) -> VocabResult<Option<BTreeSet<String>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut codes = BTreeSet::new();
        for raw in values {
            match self.normalize(vocab, raw)? {
                Some(code) => {
                    codes.insert(code);
                }
                None => debug!("No '{}' term for '{}'", vocab, raw),
            }
        }
        Ok(if codes.is_empty() { None } else { Some(codes) })
    }
}

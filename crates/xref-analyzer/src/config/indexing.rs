use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

pub const MIN_INDEXING_CONCURRENCY: usize = 1;
pub const MAX_INDEXING_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingSettings {
    /// Upper bound on in-flight definition lookups per request.
    pub concurrency: usize,
    /// Regexes matched against file paths, in addition to the built-in
    /// minified/bundle patterns.
    pub minified_patterns: Vec<String>,
    pub hover: bool,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            minified_patterns: Vec::new(),
            hover: true,
        }
    }
}

impl IndexingSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: IndexingSettingsPatch,
    ) {
        if let Some(v) = patch.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = patch.minified_patterns {
            self.minified_patterns = v;
        }
        if let Some(v) = patch.hover {
            self.hover = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.concurrency = self.concurrency.clamp(MIN_INDEXING_CONCURRENCY, MAX_INDEXING_CONCURRENCY);
        let mut seen = HashSet::new();
        self.minified_patterns = self
            .minified_patterns
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct IndexingSettingsPatch {
    pub(crate) concurrency: Option<usize>,
    pub(crate) minified_patterns: Option<Vec<String>>,
    pub(crate) hover: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}

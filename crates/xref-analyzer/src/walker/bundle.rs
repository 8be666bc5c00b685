use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static BUILTIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\.min\.[cm]?js$", r"[.-]bundle\.js$", r"\.chunk\.js$"]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Recognizes minified and bundled files, whose identifier lists are too large
/// and too meaningless to resolve one by one.
#[derive(Debug, Clone, Default)]
pub struct BundleFilter {
    extra: Vec<Regex>,
}

impl BundleFilter {
    pub fn new(extra: &[String]) -> Self {
        let extra = extra
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    warn!("Ignoring invalid minified pattern {pattern:?}: {error}");
                    None
                },
            })
            .collect();
        Self {
            extra,
        }
    }

    pub fn is_bundle(
        &self,
        path: &Path,
    ) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        BUILTIN_PATTERNS.iter().chain(self.extra.iter()).any(|regex| regex.is_match(&normalized))
    }
}

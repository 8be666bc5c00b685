//! Server settings, split into one file per category.
//!
//! [`ServerSettings`] aggregates all categories and handles JSON
//! deserialization from LSP initialization options and
//! `didChangeConfiguration` payloads. Per-workspace values may also come from
//! `.xref-analyzer.toml`.

mod analysis;
mod dependencies;
mod indexing;
mod logging;
mod workspace;

use std::collections::HashMap;

pub use analysis::{AnalysisSettings, DEFAULT_TSSERVER, MAX_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS};
use analysis::AnalysisSettingsPatch;
pub use dependencies::{DependencySettings, PackageManager};
use dependencies::DependencySettingsPatch;
pub use indexing::{IndexingSettings, MAX_INDEXING_CONCURRENCY, MIN_INDEXING_CONCURRENCY};
use indexing::IndexingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
use logging::LoggingSettingsPatch;
use serde::Deserialize;
use serde_json::Value;
pub use workspace::{
    WORKSPACE_FILENAME, WorkspaceFile, WorkspaceFileError, WorkspaceSettings, find_workspace_file,
    load_workspace_file, parse_workspace_file,
};
use workspace::WorkspaceSettingsPatch;

pub const SETTINGS_SECTION_KEY: &str = "xref-analyzer";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerSettings {
    pub analysis: AnalysisSettings,
    pub indexing: IndexingSettings,
    pub dependencies: DependencySettings,
    pub workspace: WorkspaceSettings,
    pub logging: LoggingSettings,
}

impl ServerSettings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(
        &mut self,
        patch: ServerSettingsPatch,
    ) {
        if let Some(p) = patch.analysis {
            self.analysis.apply_patch(p);
        }
        if let Some(p) = patch.indexing {
            self.indexing.apply_patch(p);
        }
        if let Some(p) = patch.dependencies {
            self.dependencies.apply_patch(p);
        }
        if let Some(p) = patch.workspace {
            self.workspace.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.analysis.normalize();
        self.indexing.normalize();
        self.workspace.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    analysis: Option<AnalysisSettingsPatch>,
    indexing: Option<IndexingSettingsPatch>,
    dependencies: Option<DependencySettingsPatch>,
    workspace: Option<WorkspaceSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;

use std::{collections::HashMap, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::analysis::TsServerConfig;

pub const DEFAULT_TSSERVER: &str = "tsserver";
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub tsserver_path: String,
    pub extra_args: Vec<String>,
    pub request_timeout_ms: u64,
    /// Compiler release used when tsserver does not report one.
    pub compiler_version: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            tsserver_path: DEFAULT_TSSERVER.to_string(),
            extra_args: Vec::new(),
            request_timeout_ms: 30_000,
            compiler_version: None,
        }
    }
}

impl AnalysisSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: AnalysisSettingsPatch,
    ) {
        if let Some(v) = patch.tsserver_path {
            self.tsserver_path = v;
        }
        if let Some(v) = patch.extra_args {
            self.extra_args = v;
        }
        if let Some(v) = patch.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = patch.compiler_version {
            self.compiler_version = Some(v);
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.tsserver_path = self.tsserver_path.trim().to_string();
        if self.tsserver_path.is_empty() {
            self.tsserver_path = DEFAULT_TSSERVER.to_string();
        }
        self.extra_args = self.extra_args.iter().map(|arg| arg.trim().to_string()).filter(|arg| !arg.is_empty()).collect();
        self.request_timeout_ms = self.request_timeout_ms.clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);
        self.compiler_version = self
            .compiler_version
            .as_deref()
            .map(|version| version.trim().trim_start_matches('v').to_string())
            .filter(|version| !version.is_empty());
    }

    pub fn tsserver_config(
        &self,
        project_root: Option<PathBuf>,
    ) -> TsServerConfig {
        TsServerConfig {
            command: self.tsserver_path.clone(),
            args: self.extra_args.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            compiler_version: self.compiler_version.clone(),
            project_root,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct AnalysisSettingsPatch {
    pub(crate) tsserver_path: Option<String>,
    pub(crate) extra_args: Option<Vec<String>>,
    pub(crate) request_timeout_ms: Option<u64>,
    pub(crate) compiler_version: Option<String>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}

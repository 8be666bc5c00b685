//! The capability boundary to the source-language service.
//!
//! Everything the pipeline knows about TypeScript semantics comes through
//! [`AnalysisHost`]. Offsets crossing this boundary are UTF-16 code units.

mod tsserver;
mod types;

use std::path::Path;

use thiserror::Error;

pub use tsserver::{TsServerConfig, TsServerHost};
pub use types::{DefinitionInfo, NavigationTree, QuickInfo, ReferenceEntry, TextSpan, symbol_kind};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis host is not running")]
    Closed,

    #[error("{command} timed out after {after_ms}ms")]
    Timeout {
        command: String,
        after_ms: u64,
    },

    #[error("{command} failed: {message}")]
    Request {
        command: String,
        message: String,
    },

    #[error("malformed host message: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[tower_lsp::async_trait]
pub trait AnalysisHost: Send + Sync {
    /// Make `text` the current content of `path`. Repeated calls with the same
    /// content are no-ops.
    async fn ensure_loaded(
        &self,
        path: &Path,
        text: &str,
    ) -> Result<(), HostError>;

    async fn declaration_tree(
        &self,
        path: &Path,
    ) -> Result<Option<NavigationTree>, HostError>;

    async fn quick_info_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Option<QuickInfo>, HostError>;

    async fn definition_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Vec<DefinitionInfo>, HostError>;

    async fn references_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Vec<ReferenceEntry>, HostError>;

    /// Re-read project configuration, e.g. after dependencies were installed.
    async fn reload_projects(&self) -> Result<(), HostError>;

    /// Release of the running compiler, used to pin compiler-library locations.
    fn compiler_version(&self) -> Option<String>;

    async fn shutdown(&self);
}

#[cfg(test)]
#[path = "../../tests/src/analysis/analysis_tests.rs"]
mod tests;

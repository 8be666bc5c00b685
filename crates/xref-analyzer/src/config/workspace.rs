use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::canonical::MonorepoEntry;

pub const WORKSPACE_FILENAME: &str = ".xref-analyzer.toml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSettings {
    /// Repository of the workspace itself, for packages whose manifest does
    /// not declare one.
    pub repo_uri: Option<String>,
    /// Monorepo layouts in addition to the built-in table.
    pub monorepos: Vec<MonorepoEntry>,
}

impl WorkspaceSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: WorkspaceSettingsPatch,
    ) {
        if let Some(v) = patch.repo_uri {
            self.repo_uri = Some(v);
        }
        if let Some(v) = patch.monorepos {
            self.monorepos = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.repo_uri = self.repo_uri.as_deref().map(str::trim).filter(|uri| !uri.is_empty()).map(str::to_string);
        self.monorepos.retain(|entry| !entry.repo.trim().is_empty() && !entry.package.trim().is_empty());
    }

    /// Fill gaps from the workspace file. Client settings win for `repoUri`;
    /// monorepo entries from both sources apply, client entries last.
    pub fn with_file(
        &self,
        file: WorkspaceFile,
    ) -> Self {
        let mut monorepos = file.monorepos;
        monorepos.extend(self.monorepos.iter().cloned());
        let mut merged = Self {
            repo_uri: self.repo_uri.clone().or(file.repo_uri),
            monorepos,
        };
        merged.normalize();
        merged
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct WorkspaceSettingsPatch {
    pub(crate) repo_uri: Option<String>,
    pub(crate) monorepos: Option<Vec<MonorepoEntry>>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}

/// Contents of `.xref-analyzer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub repo_uri: Option<String>,
    #[serde(rename = "monorepo")]
    pub monorepos: Vec<MonorepoEntry>,
}

#[derive(Error, Debug)]
pub enum WorkspaceFileError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Walks parent directories from `start` looking for `.xref-analyzer.toml`.
pub fn find_workspace_file(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    loop {
        let candidate = dir.join(WORKSPACE_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

pub fn parse_workspace_file(
    content: &str,
    path: &Path,
) -> Result<WorkspaceFile, WorkspaceFileError> {
    toml::from_str(content).map_err(|source| WorkspaceFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn load_workspace_file(path: &Path) -> Result<WorkspaceFile, WorkspaceFileError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|source| WorkspaceFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_workspace_file(&content, path)
}

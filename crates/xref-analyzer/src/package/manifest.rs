//! `package.json` parsing.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "package.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of a `package.json` the resolver cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Repository URL exactly as declared (shorthands included).
    pub repository: Option<String>,
    /// Sub-directory of the repository holding this package (monorepos).
    pub directory: Option<String>,
}

impl PackageManifest {
    /// Nested manifests that only mark module format (`{"type": "module"}`)
    /// carry neither name nor version and do not define a package.
    pub fn is_marker(&self) -> bool {
        self.name.is_none() && self.version.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    repository: Option<RepositoryField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryField {
    Url(String),
    Detailed {
        url: Option<String>,
        directory: Option<String>,
    },
}

pub fn parse_manifest(
    content: &str,
    path: &Path,
) -> Result<PackageManifest, ManifestError> {
    let raw: RawManifest = serde_json::from_str(content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let (repository, directory) = match raw.repository {
        Some(RepositoryField::Url(url)) => (Some(url), None),
        Some(RepositoryField::Detailed {
            url,
            directory,
        }) => (url, directory),
        None => (None, None),
    };

    Ok(PackageManifest {
        name: non_empty(raw.name),
        version: non_empty(raw.version),
        repository: non_empty(repository),
        directory: non_empty(directory).map(|dir| dir.trim_matches('/').to_string()),
    })
}

pub async fn read_manifest(path: &Path) -> Result<PackageManifest, ManifestError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content, path)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    lsp_ext::PackageLocator,
    package::{
        install_path::DependencyPath,
        manifest::{MANIFEST_FILENAME, PackageManifest, read_manifest},
    },
};

/// The package owning a file, with the manifest details the rewriter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub locator: PackageLocator,
    pub manifest_dir: PathBuf,
    /// `repository.directory` from the manifest.
    pub directory: Option<String>,
    pub is_dependency: bool,
}

/// Per-request memo of package lookups, keyed by the directory searched from.
///
/// The first value stored for a directory wins, so a package's identity does
/// not change for the rest of the request even if manifests change on disk.
#[derive(Debug, Default)]
pub struct PackageCache {
    entries: DashMap<PathBuf, Option<Arc<ResolvedPackage>>>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(
        &self,
        dir: &Path,
    ) -> Option<Option<Arc<ResolvedPackage>>> {
        self.entries.get(dir).map(|entry| entry.value().clone())
    }

    fn insert_first(
        &self,
        dir: PathBuf,
        value: Option<Arc<ResolvedPackage>>,
    ) -> Option<Arc<ResolvedPackage>> {
        self.entries.entry(dir).or_insert(value).value().clone()
    }
}

/// Determines which package owns a file.
#[derive(Debug, Clone, Default)]
pub struct PackageResolver {
    workspace_roots: Vec<PathBuf>,
    workspace_repo: Option<String>,
}

impl PackageResolver {
    pub fn new(
        workspace_roots: Vec<PathBuf>,
        workspace_repo: Option<String>,
    ) -> Self {
        Self {
            workspace_roots,
            workspace_repo,
        }
    }

    pub fn workspace_roots(&self) -> &[PathBuf] {
        &self.workspace_roots
    }

    pub fn workspace_root_for(
        &self,
        path: &Path,
    ) -> Option<&Path> {
        self.workspace_roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.as_os_str().len())
            .map(PathBuf::as_path)
    }

    /// Resolve the locator for `file`. `None` means "no locator", never a failure.
    pub async fn resolve(
        &self,
        file: &Path,
        cache: &PackageCache,
    ) -> Option<PackageLocator> {
        self.resolve_package(file, cache).await.map(|package| package.locator.clone())
    }

    pub async fn resolve_package(
        &self,
        file: &Path,
        cache: &PackageCache,
    ) -> Option<Arc<ResolvedPackage>> {
        let start = file.parent()?.to_path_buf();
        if let Some(hit) = cache.get(&start) {
            return hit;
        }

        let resolved = self.lookup(file).await.map(Arc::new);
        cache.insert_first(start, resolved)
    }

    async fn lookup(
        &self,
        file: &Path,
    ) -> Option<ResolvedPackage> {
        if let Some(dependency) = DependencyPath::parse(file) {
            return self.lookup_dependency(file, &dependency).await;
        }

        let root = self.workspace_root_for(file)?.to_path_buf();
        let found = find_manifest(file, &root).await;

        let (manifest_dir, manifest) = match found {
            Some(found) => found,
            None => {
                let repo = self.workspace_repo.clone()?;
                return Some(ResolvedPackage {
                    locator: PackageLocator {
                        name: None,
                        version: None,
                        repo_uri: Some(repo),
                    },
                    manifest_dir: root,
                    directory: None,
                    is_dependency: false,
                });
            },
        };

        let repo_uri = manifest.repository.clone().or_else(|| self.workspace_repo.clone());
        if manifest_dir == root && repo_uri.is_none() {
            debug!("{} belongs to the workspace root package without repository metadata", file.display());
            return None;
        }

        Some(ResolvedPackage {
            locator: PackageLocator {
                name: manifest.name,
                version: manifest.version,
                repo_uri,
            },
            manifest_dir,
            directory: manifest.directory,
            is_dependency: false,
        })
    }

    async fn lookup_dependency(
        &self,
        file: &Path,
        dependency: &DependencyPath,
    ) -> Option<ResolvedPackage> {
        let (manifest_dir, manifest) = find_manifest(file, &dependency.package_root).await?;
        Some(ResolvedPackage {
            locator: PackageLocator {
                name: manifest.name.or_else(|| Some(dependency.package_dir.clone())),
                version: manifest.version,
                repo_uri: manifest.repository,
            },
            manifest_dir,
            directory: manifest.directory,
            is_dependency: true,
        })
    }
}

/// Walk from the file's directory up to `stop` (inclusive) and return the
/// first manifest that defines a package.
async fn find_manifest(
    file: &Path,
    stop: &Path,
) -> Option<(PathBuf, PackageManifest)> {
    let mut dir = file.parent();
    while let Some(current) = dir {
        let candidate = current.join(MANIFEST_FILENAME);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            match read_manifest(&candidate).await {
                Ok(manifest) if !manifest.is_marker() => return Some((current.to_path_buf(), manifest)),
                Ok(_) => {},
                Err(error) => debug!("Ignoring unreadable manifest: {error}"),
            }
        }
        if current == stop {
            break;
        }
        dir = current.parent();
    }
    None
}

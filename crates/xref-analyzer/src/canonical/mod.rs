//! Rewrites dependency-install locations into canonical upstream addresses.
//!
//! A definition found at `/ws/node_modules/lodash/map.js` is reported as
//! `git://github.com/lodash/lodash/blob/4.17.11/map.js`, so references from
//! different repositories to the same upstream symbol agree on its address.

mod overrides;
mod repo_url;

use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tower_lsp::lsp_types::{Location, Url};
use tracing::debug;

pub use overrides::{
    COMPILER_PACKAGE, DEFAULT_BRANCH, MonorepoEntry, MonorepoTable, TYPES_DIRECTORY, TYPES_PACKAGE_PREFIX,
    TYPES_REPOSITORY, TYPES_REVISION,
};
pub use repo_url::{CANONICAL_SCHEME, RepoUrl};

use crate::package::{DependencyPath, PackageCache, PackageResolver, ResolvedPackage};

const REVISION_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// A location after canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLocation {
    pub location: Location,
    /// Path of the file inside its upstream repository, when known.
    pub repo_path: Option<String>,
    pub rewritten: bool,
}

impl CanonicalLocation {
    fn unchanged(location: &Location) -> Self {
        Self {
            location: location.clone(),
            repo_path: None,
            rewritten: false,
        }
    }
}

pub struct CanonicalRewriter {
    resolver: PackageResolver,
    monorepos: Arc<MonorepoTable>,
    compiler_version: Option<String>,
}

impl CanonicalRewriter {
    pub fn new(
        resolver: PackageResolver,
        monorepos: Arc<MonorepoTable>,
        compiler_version: Option<String>,
    ) -> Self {
        Self {
            resolver,
            monorepos,
            compiler_version,
        }
    }

    pub fn resolver(&self) -> &PackageResolver {
        &self.resolver
    }

    /// Canonicalize `location`. Best effort: anything that cannot be mapped
    /// to an upstream repository is returned unchanged.
    pub async fn rewrite(
        &self,
        location: &Location,
        cache: &PackageCache,
    ) -> CanonicalLocation {
        if let Some(canonical) = normalize_canonical(location) {
            return canonical;
        }

        let Ok(path) = location.uri.to_file_path() else {
            return CanonicalLocation::unchanged(location);
        };
        let Some(dependency) = DependencyPath::parse(&path) else {
            return CanonicalLocation::unchanged(location);
        };

        let package = self.resolver.resolve_package(&path, cache).await;
        self.rewrite_dependency(location, &dependency, package.as_deref())
    }

    /// Canonicalize a location already known to be inside `dependency`.
    pub fn rewrite_dependency(
        &self,
        location: &Location,
        dependency: &DependencyPath,
        package: Option<&ResolvedPackage>,
    ) -> CanonicalLocation {
        let Some(package) = package else {
            return CanonicalLocation::unchanged(location);
        };
        let name = package.locator.name.as_deref().unwrap_or(&dependency.package_dir);
        let raw_repo = match package.locator.repo_uri.as_deref() {
            Some(repo) => repo,
            None if name.starts_with(TYPES_PACKAGE_PREFIX) => TYPES_REPOSITORY,
            None => return CanonicalLocation::unchanged(location),
        };
        let Some(repo) = RepoUrl::parse(raw_repo) else {
            debug!("Unrecognized repository {raw_repo:?} for {}", dependency.package_dir);
            return CanonicalLocation::unchanged(location);
        };

        let version = package.locator.version.as_deref();
        let within = dependency.within_package.as_str();

        let (revision, repo_path) = if name == COMPILER_PACKAGE {
            let release = self.compiler_version.as_deref().or(version);
            (release.map_or_else(|| DEFAULT_BRANCH.to_string(), |v| format!("v{v}")), within.to_string())
        } else if let Some(types_name) = name.strip_prefix(TYPES_PACKAGE_PREFIX) {
            (TYPES_REVISION.to_string(), join_path(&format!("{TYPES_DIRECTORY}/{types_name}"), within))
        } else if let Some(entry) = self.monorepos.lookup(&repo.repo_uri(), name) {
            let revision = match version {
                Some(v) => format!("{}{v}", entry.revision_namespace),
                None => DEFAULT_BRANCH.to_string(),
            };
            (revision, join_path(&entry.path_prefix, within))
        } else {
            let revision = version.unwrap_or(DEFAULT_BRANCH).to_string();
            (revision, join_path(package.directory.as_deref().unwrap_or_default(), within))
        };

        let address = format!("{}/blob/{}/{}", repo.canonical_base(), encode_revision(&revision), repo_path);
        match Url::parse(&address) {
            Ok(uri) => CanonicalLocation {
                location: Location {
                    uri,
                    range: location.range,
                },
                repo_path: Some(repo_path),
                rewritten: true,
            },
            Err(error) => {
                debug!("Failed to build canonical address {address}: {error}");
                CanonicalLocation::unchanged(location)
            },
        }
    }
}

/// Locations already in canonical form only get their separators normalized.
fn normalize_canonical(location: &Location) -> Option<CanonicalLocation> {
    if location.uri.scheme() != CANONICAL_SCHEME {
        return None;
    }

    let normalized = location.uri.as_str().replace('\\', "/").replace("%5C", "/").replace("%5c", "/");
    let uri = Url::parse(&normalized).unwrap_or_else(|_| location.uri.clone());
    let repo_path = uri
        .path()
        .split_once("/blob/")
        .and_then(|(_, rest)| rest.split_once('/'))
        .map(|(_, path)| path.to_string());

    Some(CanonicalLocation {
        location: Location {
            uri,
            range: location.range,
        },
        repo_path,
        rewritten: false,
    })
}

/// Namespaced release tags (`@scope/pkg_v1.0.0`) are percent-encoded so the
/// revision stays a single path segment.
pub fn encode_revision(revision: &str) -> String {
    if revision.contains('/') || revision.contains('@') {
        utf8_percent_encode(revision, REVISION_ENCODE_SET).to_string()
    } else {
        revision.to_string()
    }
}

fn join_path(
    prefix: &str,
    rest: &str,
) -> String {
    let prefix = prefix.trim_matches('/');
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{rest}"),
    }
}

#[cfg(test)]
#[path = "../../tests/src/canonical/canonical_tests.rs"]
mod tests;

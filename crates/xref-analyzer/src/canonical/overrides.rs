use std::collections::HashMap;

use serde::Deserialize;

/// Package whose revision is pinned to the running compiler's release.
pub const COMPILER_PACKAGE: &str = "typescript";

/// Prefix of community type-declaration packages (`@types/node`).
pub const TYPES_PACKAGE_PREFIX: &str = "@types/";
pub const TYPES_REPOSITORY: &str = "github.com/DefinitelyTyped/DefinitelyTyped";
pub const TYPES_DIRECTORY: &str = "types";
pub const TYPES_REVISION: &str = "master";

pub const DEFAULT_BRANCH: &str = "master";

/// Where one package of a multi-package repository lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonorepoEntry {
    /// `host/org/repo` of the monorepo.
    pub repo: String,
    pub package: String,
    /// Prepended to the version to form the release tag, e.g. `v` or
    /// `@microsoft/api-extractor_v`.
    #[serde(default)]
    pub revision_namespace: String,
    /// Directory of the package inside the repository.
    pub path_prefix: String,
}

impl MonorepoEntry {
    fn builtin(
        repo: &str,
        package: &str,
        revision_namespace: &str,
        path_prefix: &str,
    ) -> Self {
        Self {
            repo: repo.to_string(),
            package: package.to_string(),
            revision_namespace: revision_namespace.to_string(),
            path_prefix: path_prefix.to_string(),
        }
    }
}

/// Lookup of known monorepo packages, keyed by lower-cased repo and package name.
#[derive(Debug, Clone)]
pub struct MonorepoTable {
    entries: HashMap<(String, String), MonorepoEntry>,
}

impl Default for MonorepoTable {
    fn default() -> Self {
        Self::with_entries(builtin_entries())
    }
}

impl MonorepoTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_entries(entries: impl IntoIterator<Item = MonorepoEntry>) -> Self {
        let mut table = Self::empty();
        table.extend(entries);
        table
    }

    /// Later entries replace earlier ones for the same repo and package.
    pub fn extend(
        &mut self,
        entries: impl IntoIterator<Item = MonorepoEntry>,
    ) {
        for entry in entries {
            let key = (entry.repo.trim_matches('/').to_ascii_lowercase(), entry.package.clone());
            self.entries.insert(key, entry);
        }
    }

    pub fn lookup(
        &self,
        repo_uri: &str,
        package: &str,
    ) -> Option<&MonorepoEntry> {
        self.entries.get(&(repo_uri.trim_matches('/').to_ascii_lowercase(), package.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_entries() -> Vec<MonorepoEntry> {
    vec![
        MonorepoEntry::builtin("github.com/babel/babel", "@babel/core", "v", "packages/babel-core"),
        MonorepoEntry::builtin("github.com/babel/babel", "@babel/parser", "v", "packages/babel-parser"),
        MonorepoEntry::builtin("github.com/babel/babel", "@babel/traverse", "v", "packages/babel-traverse"),
        MonorepoEntry::builtin("github.com/babel/babel", "@babel/types", "v", "packages/babel-types"),
        MonorepoEntry::builtin("github.com/angular/angular", "@angular/core", "", "packages/core"),
        MonorepoEntry::builtin("github.com/angular/angular", "@angular/common", "", "packages/common"),
        MonorepoEntry::builtin("github.com/angular/angular", "@angular/router", "", "packages/router"),
        MonorepoEntry::builtin("github.com/facebook/jest", "jest-cli", "v", "packages/jest-cli"),
        MonorepoEntry::builtin("github.com/facebook/jest", "expect", "v", "packages/expect"),
        MonorepoEntry::builtin(
            "github.com/microsoft/web-build-tools",
            "@microsoft/api-extractor",
            "@microsoft/api-extractor_v",
            "apps/api-extractor",
        ),
        MonorepoEntry::builtin(
            "github.com/microsoft/web-build-tools",
            "@microsoft/node-core-library",
            "@microsoft/node-core-library_v",
            "libraries/node-core-library",
        ),
    ]
}

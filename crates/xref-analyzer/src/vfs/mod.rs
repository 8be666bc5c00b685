//! Source text lookup: open documents first, then disk.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::{document::DocumentStore, package::DEPENDENCY_DIR};

/// Compiler library declarations may live outside the workspace (global
/// installs) and are always readable.
const COMPILER_LIB_SEGMENT: &str = "typescript";

pub struct SourceOverlay {
    documents: Arc<DocumentStore>,
    disk: DashMap<PathBuf, Arc<str>>,
    roots: Vec<PathBuf>,
}

impl SourceOverlay {
    pub fn new(
        documents: Arc<DocumentStore>,
        roots: Vec<PathBuf>,
    ) -> Self {
        Self {
            documents,
            disk: DashMap::new(),
            roots,
        }
    }

    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.documents
    }

    /// Current text of `path`, or `None` when it is unreadable or outside
    /// the workspace.
    pub async fn read(
        &self,
        path: &Path,
    ) -> Option<Arc<str>> {
        if let Ok(uri) = Url::from_file_path(path)
            && let Some(text) = self.documents.get_content(&uri)
        {
            return Some(Arc::from(text));
        }

        if let Some(cached) = self.disk.get(path) {
            return Some(Arc::clone(cached.value()));
        }

        if !self.is_readable(path) {
            debug!("Refusing to read {} outside the workspace", path.display());
            return None;
        }

        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let entry = self.disk.entry(path.to_path_buf()).or_insert_with(|| Arc::from(text));
                Some(Arc::clone(entry.value()))
            },
            Err(error) => {
                debug!("Failed to read {}: {error}", path.display());
                None
            },
        }
    }

    /// Drop the cached disk copy, e.g. after the file was closed or changed
    /// on disk.
    pub fn invalidate(
        &self,
        path: &Path,
    ) {
        self.disk.remove(path);
    }

    pub fn clear(&self) {
        self.disk.clear();
    }

    pub fn is_readable(
        &self,
        path: &Path,
    ) -> bool {
        self.roots.iter().any(|root| path.starts_with(root)) || is_compiler_lib(path)
    }
}

fn is_compiler_lib(path: &Path) -> bool {
    let mut components = path.components().map(|component| component.as_os_str());
    while let Some(component) = components.next() {
        if component == DEPENDENCY_DIR {
            let mut rest = components.clone();
            if rest.next().is_some_and(|name| name == COMPILER_LIB_SEGMENT) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
#[path = "../../tests/src/vfs/vfs_tests.rs"]
mod tests;

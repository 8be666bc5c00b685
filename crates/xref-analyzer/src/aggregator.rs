//! Joins the symbol and reference streams of one file into a [`Full`]
//! record, emitted as append-only patch operations.

use std::{path::Path, sync::Arc};

use futures::FutureExt;
use tokio::sync::mpsc::UnboundedSender;
use tower_lsp::lsp_types::{Position, Url};
use tracing::{debug, error, warn};

use crate::{
    analysis::AnalysisHost,
    canonical::CanonicalRewriter,
    config::IndexingSettings,
    lsp_ext::{Full, PatchOperation, SymbolLocator},
    package::PackageCache,
    text_pos::LineIndex,
    vfs::SourceOverlay,
    walker::{BundleFilter, DefinitionResolver, FileContext, collect_references, collect_symbols},
};

/// Everything one request needs, borrowed from the workspace.
pub struct Aggregator<'a> {
    pub host: &'a dyn AnalysisHost,
    pub rewriter: &'a CanonicalRewriter,
    pub overlay: &'a SourceOverlay,
    pub bundles: &'a BundleFilter,
    pub indexing: &'a IndexingSettings,
}

impl Aggregator<'_> {
    /// Stream the `textDocument/full` response for `uri` into `sink`.
    ///
    /// The empty document is always sent first. The `Full` value follows
    /// unless the file has no workspace or no readable source, in which case
    /// the placeholder is the whole response.
    pub async fn full(
        &self,
        uri: &Url,
        reference: bool,
        sink: &UnboundedSender<PatchOperation>,
    ) {
        let _ = sink.send(PatchOperation::initialize_empty());

        let Some(full) = self.compute_full(uri, reference).await else {
            return;
        };
        match serde_json::to_value(&full) {
            Ok(value) => {
                let _ = sink.send(PatchOperation::append(value));
            },
            Err(err) => error!("Failed to serialize full response for {uri}: {err}"),
        }
    }

    pub async fn compute_full(
        &self,
        uri: &Url,
        reference: bool,
    ) -> Option<Full> {
        let path = uri.to_file_path().ok()?;
        if self.rewriter.resolver().workspace_root_for(&path).is_none() {
            debug!("{} is outside every workspace root", path.display());
            return None;
        }
        let text = self.load(&path).await?;

        let packages = PackageCache::new();
        let package = self.rewriter.resolver().resolve(&path, &packages).await;
        let lines = LineIndex::new(&text);
        let resolver = DefinitionResolver::new(self.rewriter, self.overlay, &packages);
        let relative_path = resolver.relative_path(&path);
        let module_name = resolver.module_name(&path);
        let file = FileContext {
            path: &path,
            uri,
            lines: &lines,
            relative_path: &relative_path,
            module_name: module_name.as_deref(),
            package: package.as_ref(),
        };

        let concurrency = self.indexing.concurrency;
        let symbols = collect_symbols(self.host, &file, self.indexing.hover, concurrency).boxed();
        let references = async {
            if !reference {
                return Vec::new();
            }
            if self.bundles.is_bundle(&path) {
                debug!("Skipping references of bundled file {}", path.display());
                return Vec::new();
            }
            collect_references(self.host, &file, &resolver, concurrency).await
        }
        .boxed();
        let (symbols, references) = tokio::join!(symbols, references);

        Some(Full {
            symbols: Some(symbols),
            references: Some(references),
        })
    }

    /// Canonical locators for the definitions of the symbol at `position`.
    pub async fn locate_definitions(
        &self,
        uri: &Url,
        position: Position,
    ) -> Vec<SymbolLocator> {
        let Ok(path) = uri.to_file_path() else {
            return Vec::new();
        };
        let Some(text) = self.load(&path).await else {
            return Vec::new();
        };
        let Some(offset) = LineIndex::new(&text).offset(position) else {
            return Vec::new();
        };

        let definitions = match self.host.definition_at(&path, offset).await {
            Ok(definitions) => definitions,
            Err(err) => {
                warn!("Definition lookup in {} at {offset} failed: {err}", path.display());
                return Vec::new();
            },
        };

        let packages = PackageCache::new();
        let resolver = DefinitionResolver::new(self.rewriter, self.overlay, &packages);
        let mut locators = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            if let Some(locator) = resolver.locate(definition).await {
                locators.push(locator);
            }
        }
        locators
    }

    /// Current text of `path`, made current in the host as well.
    pub async fn load(
        &self,
        path: &Path,
    ) -> Option<Arc<str>> {
        let Some(text) = self.overlay.read(path).await else {
            debug!("No source for {}", path.display());
            return None;
        };
        if let Err(err) = self.host.ensure_loaded(path, &text).await {
            warn!("Failed to load {} into the analysis host: {err}", path.display());
            return None;
        }
        Some(text)
    }
}

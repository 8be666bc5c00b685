use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use futures::{FutureExt, StreamExt, stream};
use tower_lsp::lsp_types::{Location, Url};
use tracing::{debug, warn};

use super::{FileContext, lexer};
use crate::{
    analysis::{AnalysisHost, DefinitionInfo, HostError, TextSpan, symbol_kind},
    canonical::CanonicalRewriter,
    lsp_ext::{Reference, ReferenceCategory, SymbolLocator},
    package::{DependencyPath, PackageCache},
    qname::{SymbolDescriptor, qname},
    text_pos::LineIndex,
    vfs::SourceOverlay,
};

/// Why an identifier contributed no reference.
#[derive(Debug)]
pub enum SkipReason {
    NoDefinition,
    /// Every definition pointed at a file whose text could not be read.
    Unlocatable,
    Host(HostError),
}

#[derive(Debug)]
pub enum LookupOutcome {
    Resolved(Vec<Reference>),
    Skipped(SkipReason),
}

/// Turns host definitions into canonical [`SymbolLocator`]s. Line tables of
/// definition files are memoized for the lifetime of the resolver.
pub struct DefinitionResolver<'a> {
    rewriter: &'a CanonicalRewriter,
    overlay: &'a SourceOverlay,
    packages: &'a PackageCache,
    lines: DashMap<PathBuf, Option<Arc<LineIndex>>>,
}

impl<'a> DefinitionResolver<'a> {
    pub fn new(
        rewriter: &'a CanonicalRewriter,
        overlay: &'a SourceOverlay,
        packages: &'a PackageCache,
    ) -> Self {
        Self {
            rewriter,
            overlay,
            packages,
            lines: DashMap::new(),
        }
    }

    pub async fn locate(
        &self,
        definition: &DefinitionInfo,
    ) -> Option<SymbolLocator> {
        let path = PathBuf::from(&definition.file_name);
        let lines = self.line_index(&path).await?;
        let uri = Url::from_file_path(&path).ok()?;
        let location = Location::new(uri, lines.range(definition.text_span));

        let canonical = self.rewriter.rewrite(&location, self.packages).await;
        let package = self.rewriter.resolver().resolve(&path, self.packages).await;
        let relative = canonical.repo_path.clone().unwrap_or_else(|| self.relative_path(&path));

        let descriptor = SymbolDescriptor {
            name: definition.name.clone(),
            kind: symbol_kind(&definition.kind),
            container_name: self.relative_container(&definition.container_name, &path),
            file_path: relative.clone(),
            package,
        };

        Some(SymbolLocator {
            qname: Some(qname(&descriptor)),
            symbol_kind: Some(descriptor.kind),
            path: Some(relative),
            location: Some(canonical.location),
            package: descriptor.package,
        })
    }

    async fn line_index(
        &self,
        path: &Path,
    ) -> Option<Arc<LineIndex>> {
        if let Some(cached) = self.lines.get(path) {
            return cached.value().clone();
        }
        let index = self.overlay.read(path).await.map(|text| Arc::new(LineIndex::new(&text)));
        self.lines.entry(path.to_path_buf()).or_insert(index).value().clone()
    }

    /// Path relative to the owning workspace root, or the absolute path for
    /// files outside every root.
    pub fn relative_path(
        &self,
        path: &Path,
    ) -> String {
        let relative = self
            .rewriter
            .resolver()
            .workspace_root_for(path)
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }

    /// The host names file modules by absolute path (`"/ws/foo/b"`). Make
    /// such containers relative to their package or workspace root.
    fn relative_container(
        &self,
        container: &str,
        declared_in: &Path,
    ) -> String {
        let unquoted = container.trim_matches('"');
        if unquoted.len() == container.len() || !Path::new(unquoted).is_absolute() {
            return container.to_string();
        }

        let module = Path::new(unquoted);
        match self.module_root(declared_in).as_deref().and_then(|root| module.strip_prefix(root).ok()) {
            Some(relative) => format!("\"{}\"", relative.to_string_lossy().replace('\\', "/")),
            None => container.to_string(),
        }
    }

    /// Quoted module name of the file at `path`, relative to the same root
    /// used for definition containers: `"foo/b"` for `<root>/foo/b.ts`.
    pub fn module_name(
        &self,
        path: &Path,
    ) -> Option<String> {
        let root = self.module_root(path)?;
        let relative = path.strip_prefix(&root).ok()?.to_string_lossy().replace('\\', "/");
        Some(format!("\"{}\"", strip_source_extension(&relative)))
    }

    fn module_root(
        &self,
        path: &Path,
    ) -> Option<PathBuf> {
        match DependencyPath::parse(path) {
            Some(dependency) => Some(dependency.package_root),
            None => self.rewriter.resolver().workspace_root_for(path).map(Path::to_path_buf),
        }
    }
}

const SOURCE_EXTENSIONS: &[&str] =
    &[".d.ts", ".d.mts", ".d.cts", ".mts", ".cts", ".tsx", ".ts", ".mjs", ".cjs", ".jsx", ".js"];

fn strip_source_extension(path: &str) -> &str {
    SOURCE_EXTENSIONS.iter().find_map(|extension| path.strip_suffix(extension)).unwrap_or(path)
}

/// Resolve every identifier in `file`. Lookups run concurrently, so the
/// result order does not follow the source order.
pub async fn collect_references(
    host: &dyn AnalysisHost,
    file: &FileContext<'_>,
    resolver: &DefinitionResolver<'_>,
    concurrency: usize,
) -> Vec<Reference> {
    let spans = lexer::identifiers(file.lines.text())
        .map(|identifier| (file.lines.byte_to_utf16(identifier.start), file.lines.byte_to_utf16(identifier.end)))
        .collect::<Vec<_>>();

    let outcomes = stream::iter(spans)
        .map(|(start, end)| {
            async move {
                let outcome = lookup(host, file, resolver, start, end).await;
                (start, outcome)
            }
            .boxed()
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut references = Vec::new();
    let mut skipped = 0usize;
    for (offset, outcome) in outcomes {
        match outcome {
            LookupOutcome::Resolved(resolved) => references.extend(resolved),
            LookupOutcome::Skipped(reason) => {
                skipped += 1;
                match reason {
                    SkipReason::Host(error) => {
                        warn!("Definition lookup in {} at {offset} failed: {error}", file.path.display());
                    },
                    SkipReason::Unlocatable => {
                        debug!("Definitions for {} at {offset} point at unreadable files", file.path.display());
                    },
                    SkipReason::NoDefinition => {},
                }
            },
        }
    }
    debug!("{}: {} references, {skipped} identifiers skipped", file.path.display(), references.len());
    references
}

pub async fn lookup(
    host: &dyn AnalysisHost,
    file: &FileContext<'_>,
    resolver: &DefinitionResolver<'_>,
    start: usize,
    end: usize,
) -> LookupOutcome {
    let definitions = match host.definition_at(file.path, start).await {
        Ok(definitions) if definitions.is_empty() => return LookupOutcome::Skipped(SkipReason::NoDefinition),
        Ok(definitions) => definitions,
        Err(error) => return LookupOutcome::Skipped(SkipReason::Host(error)),
    };

    let location = Location::new(file.uri.clone(), file.lines.range(TextSpan::new(start, end - start)));
    let mut references = Vec::with_capacity(definitions.len());
    for definition in &definitions {
        if let Some(target) = resolver.locate(definition).await {
            references.push(Reference {
                category: ReferenceCategory::Uncategorized,
                location: location.clone(),
                target,
            });
        }
    }

    if references.is_empty() {
        LookupOutcome::Skipped(SkipReason::Unlocatable)
    } else {
        LookupOutcome::Resolved(references)
    }
}

#[cfg(test)]
#[path = "../../tests/src/walker/references_tests.rs"]
mod tests;

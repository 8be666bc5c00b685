use std::{panic::AssertUnwindSafe, path::PathBuf, sync::Arc};

use futures::FutureExt;
use serde_json::json;
use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info, warn};

use crate::{
    analysis::TextSpan,
    config::ServerSettings,
    server::state::{XrefLanguageServer, prefixed_client_message},
    text_pos::LineIndex,
    vfs::SourceOverlay,
    walker::{document_symbols, quick_info_contents},
    workspace::WorkspaceContext,
};

/// A file made current in the analysis host, with its line table.
pub(crate) struct LoadedFile {
    pub(crate) workspace: Arc<WorkspaceContext>,
    pub(crate) path: PathBuf,
    pub(crate) lines: LineIndex,
}

impl XrefLanguageServer {
    pub(crate) async fn load_file(
        &self,
        uri: &Url,
    ) -> Option<LoadedFile> {
        let workspace = self.workspace().await?;
        let path = uri.to_file_path().ok()?;
        let text = workspace.aggregator().load(&path).await?;
        Some(LoadedFile {
            workspace,
            path,
            lines: LineIndex::new(&text),
        })
    }

    async fn log_to_client(
        &self,
        message: String,
    ) {
        if !self.settings_snapshot().await.logging.level.allows_info() {
            return;
        }
        let _ = AssertUnwindSafe(self.client.log_message(MessageType::INFO, prefixed_client_message(message)))
            .catch_unwind()
            .await;
    }
}

/// Plain file location of a host span, for editor navigation.
async fn file_location(
    overlay: &SourceOverlay,
    file_name: &str,
    span: TextSpan,
) -> Option<Location> {
    let path = PathBuf::from(file_name);
    let text = overlay.read(&path).await?;
    let uri = Url::from_file_path(&path).ok()?;
    Some(Location::new(uri, LineIndex::new(&text).range(span)))
}

#[tower_lsp::async_trait]
impl LanguageServer for XrefLanguageServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing xref-analyzer...");

        self.apply_settings(ServerSettings::from_lsp_payload(params.initialization_options.as_ref())).await;
        self.set_roots(&params).await;
        self.restart_workspace().await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                experimental: Some(json!({
                    "xrefAnalyzer": {
                        "full": true,
                        "edefinition": true,
                        "partialResults": true,
                    }
                })),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "xref-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("xref-analyzer initialized");
        if let Some(workspace) = self.workspace().await {
            workspace.start_bootstrap(Some(self.client.clone()));
        }
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        self.apply_settings(current.merged_with_payload(&params.settings)).await;
        let merged = self.settings_snapshot().await;
        if merged == current {
            return;
        }

        let restart = merged.analysis != current.analysis
            || merged.workspace != current.workspace
            || merged.indexing != current.indexing;
        info!("Applied updated xref-analyzer settings");

        if restart {
            self.restart_workspace().await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down xref-analyzer");
        let workspace = self.workspace.write().await.take();
        if let Some(workspace) = workspace
            && let Some(install) = workspace.stop().await
        {
            install.cancel();
        }
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        info!("Opened {} (v{version}, {} bytes)", short_name(&uri), params.text_document.text.len());
        self.documents.open(uri.clone(), params.text_document.text, version);
        self.log_to_client(format!("Opened {}", short_name(&uri))).await;
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        self.documents.apply_changes(&uri, params.content_changes, params.text_document.version);
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        if let (Some(workspace), Ok(path)) = (self.workspace().await, uri.to_file_path()) {
            workspace.overlay().invalidate(&path);
        }
        debug!("Closed {}", short_name(&uri));
    }

    async fn hover(
        &self,
        params: HoverParams,
    ) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(file) = self.load_file(&uri).await else {
            return Ok(None);
        };
        let Some(offset) = file.lines.offset(position) else {
            return Ok(None);
        };

        match file.workspace.host().quick_info_at(&file.path, offset).await {
            Ok(Some(info)) => Ok(Some(Hover {
                contents: quick_info_contents(&info),
                range: None,
            })),
            Ok(None) => Ok(None),
            Err(err) => {
                debug!("Hover in {} at {offset} failed: {err}", short_name(&uri));
                Ok(None)
            },
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(file) = self.load_file(&uri).await else {
            return Ok(None);
        };
        let Some(offset) = file.lines.offset(position) else {
            return Ok(None);
        };

        let definitions = match file.workspace.host().definition_at(&file.path, offset).await {
            Ok(definitions) => definitions,
            Err(err) => {
                warn!("Definition lookup in {} at {offset} failed: {err}", short_name(&uri));
                return Ok(None);
            },
        };

        let mut locations = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            if let Some(location) =
                file_location(file.workspace.overlay(), &definition.file_name, definition.text_span).await
            {
                locations.push(location);
            }
        }
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn references(
        &self,
        params: ReferenceParams,
    ) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let Some(file) = self.load_file(&uri).await else {
            return Ok(None);
        };
        let Some(offset) = file.lines.offset(position) else {
            return Ok(None);
        };

        let entries = match file.workspace.host().references_at(&file.path, offset).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Reference lookup in {} at {offset} failed: {err}", short_name(&uri));
                return Ok(None);
            },
        };

        let mut locations = Vec::with_capacity(entries.len());
        for entry in entries.iter().filter(|entry| include_declaration || !entry.is_definition) {
            if let Some(location) = file_location(file.workspace.overlay(), &entry.file_name, entry.text_span).await {
                locations.push(location);
            }
        }
        Ok(Some(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(file) = self.load_file(&uri).await else {
            return Ok(None);
        };

        match file.workspace.host().declaration_tree(&file.path).await {
            Ok(Some(tree)) => Ok(Some(DocumentSymbolResponse::Nested(document_symbols(&tree, &file.lines)))),
            Ok(None) => Ok(None),
            Err(err) => {
                warn!("Declaration tree for {} unavailable: {err}", short_name(&uri));
                Ok(None)
            },
        }
    }
}

fn short_name(uri: &Url) -> String {
    uri.path().rsplit('/').next().unwrap_or(uri.path()).to_owned()
}

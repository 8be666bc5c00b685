use std::{path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tower_lsp::{
    Client,
    lsp_types::{InitializeParams, MessageType},
};
use tracing::{error, info};

use crate::{analysis::AnalysisHost, config::ServerSettings, document::DocumentStore, workspace::WorkspaceContext};

/// The xref-analyzer backend that implements the Language Server Protocol.
pub struct XrefLanguageServer {
    /// The LSP client handle, used for log messages, progress and partial results.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) documents: Arc<DocumentStore>,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: RwLock<ServerSettings>,

    /// Workspace root folders, populated during `initialize`.
    pub(crate) roots: RwLock<Vec<PathBuf>>,

    /// The running workspace, absent before `initialize` or when the
    /// analysis host failed to start.
    pub(crate) workspace: RwLock<Option<Arc<WorkspaceContext>>>,

    /// Host to use instead of spawning tsserver.
    host: Option<Arc<dyn AnalysisHost>>,

    /// tsserver executable given on the command line; wins over client settings.
    tsserver: Option<String>,
}

impl XrefLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            settings: RwLock::new(ServerSettings::default()),
            roots: RwLock::new(Vec::new()),
            workspace: RwLock::new(None),
            host: None,
            tsserver: None,
        }
    }

    pub fn with_tsserver(
        mut self,
        tsserver: Option<String>,
    ) -> Self {
        self.tsserver = tsserver.filter(|path| !path.trim().is_empty());
        self
    }

    /// Serve with an already running analysis host.
    pub fn with_host(
        client: Client,
        host: Arc<dyn AnalysisHost>,
    ) -> Self {
        Self {
            host: Some(host),
            ..Self::new(client)
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        mut settings: ServerSettings,
    ) {
        if let Some(tsserver) = &self.tsserver {
            settings.analysis.tsserver_path = tsserver.clone();
        }
        *self.settings.write().await = settings;
    }

    pub(crate) async fn workspace(&self) -> Option<Arc<WorkspaceContext>> {
        self.workspace.read().await.clone()
    }

    pub(crate) async fn set_roots(
        &self,
        params: &InitializeParams,
    ) {
        let roots = match &params.workspace_folders {
            Some(folders) if !folders.is_empty() => {
                folders.iter().filter_map(|folder| folder.uri.to_file_path().ok()).collect()
            },
            _ => params.root_uri.iter().filter_map(|uri| uri.to_file_path().ok()).collect(),
        };
        *self.roots.write().await = roots;
    }

    /// Replace the running workspace with one built from the current roots
    /// and settings. A dependency install still in flight carries over to
    /// the new workspace.
    pub(crate) async fn restart_workspace(&self) {
        let roots = self.roots.read().await.clone();
        let settings = self.settings_snapshot().await;

        let previous = self.workspace.write().await.take();
        let install = match previous {
            Some(previous) => previous.stop().await,
            None => None,
        };

        let context = match &self.host {
            Some(host) => {
                Ok(WorkspaceContext::with_host(roots, settings, Arc::clone(&self.documents), Arc::clone(host)).await)
            },
            None => WorkspaceContext::start(roots, settings, Arc::clone(&self.documents)).await,
        };

        match context {
            Ok(context) => {
                if let Some(install) = install {
                    info!("Carrying the running dependency install over to the restarted workspace");
                    context.adopt_install(install);
                }
                *self.workspace.write().await = Some(Arc::new(context));
                info!("Analysis host started");
            },
            Err(err) => {
                error!("Failed to start analysis host: {err}");
                self.client
                    .show_message(MessageType::ERROR, prefixed_client_message(format!("Failed to start tsserver: {err}")))
                    .await;
            },
        }
    }
}

const CLIENT_NOTIFICATION_PREFIX: &str = "xref-analyzer:";

pub(crate) fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}

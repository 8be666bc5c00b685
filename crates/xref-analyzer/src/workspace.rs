//! Per-workspace state with an explicit lifecycle: [`WorkspaceContext::start`]
//! builds everything a request needs, [`WorkspaceContext::stop`] tears it down.

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{sync::mpsc, task::JoinHandle};
use tower_lsp::Client;
use tracing::{info, warn};

use crate::{
    aggregator::Aggregator,
    analysis::{AnalysisHost, HostError, TsServerHost},
    bootstrap::{self, InstallEvent, PendingInstall},
    canonical::{CanonicalRewriter, MonorepoTable},
    config::{PackageManager, ServerSettings, find_workspace_file, load_workspace_file},
    document::DocumentStore,
    package::PackageResolver,
    progress::InstallProgress,
    vfs::SourceOverlay,
    walker::BundleFilter,
};

pub struct WorkspaceContext {
    roots: Vec<PathBuf>,
    settings: ServerSettings,
    host: Arc<dyn AnalysisHost>,
    overlay: Arc<SourceOverlay>,
    rewriter: CanonicalRewriter,
    bundles: BundleFilter,
    install: Mutex<Option<PendingInstall>>,
    /// Reloads projects once the install succeeds.
    finisher: Mutex<Option<JoinHandle<()>>>,
    bootstrap_started: AtomicBool,
    /// Whether [`stop`](Self::stop) shuts the host down.
    owns_host: bool,
}

impl WorkspaceContext {
    /// Spawn the tsserver host for `roots` and build the context around it.
    pub async fn start(
        roots: Vec<PathBuf>,
        settings: ServerSettings,
        documents: Arc<DocumentStore>,
    ) -> Result<Self, HostError> {
        let project_root = roots.first().cloned();
        let host = TsServerHost::spawn(settings.analysis.tsserver_config(project_root)).await?;
        let mut context = Self::with_host(roots, settings, documents, Arc::new(host)).await;
        context.owns_host = true;
        Ok(context)
    }

    /// Build the context around an already running host owned by the caller.
    pub async fn with_host(
        roots: Vec<PathBuf>,
        settings: ServerSettings,
        documents: Arc<DocumentStore>,
        host: Arc<dyn AnalysisHost>,
    ) -> Self {
        let settings = apply_workspace_file(settings, roots.first()).await;

        let mut monorepos = MonorepoTable::default();
        monorepos.extend(settings.workspace.monorepos.iter().cloned());
        let resolver = PackageResolver::new(roots.clone(), settings.workspace.repo_uri.clone());
        let rewriter = CanonicalRewriter::new(resolver, Arc::new(monorepos), host.compiler_version());
        let overlay = Arc::new(SourceOverlay::new(documents, roots.clone()));
        let bundles = BundleFilter::new(&settings.indexing.minified_patterns);

        info!(
            "Workspace ready: {} root(s), compiler {}",
            roots.len(),
            host.compiler_version().as_deref().unwrap_or("unknown")
        );

        Self {
            roots,
            settings,
            host,
            overlay,
            rewriter,
            bundles,
            install: Mutex::new(None),
            finisher: Mutex::new(None),
            bootstrap_started: AtomicBool::new(false),
            owns_host: false,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn host(&self) -> &Arc<dyn AnalysisHost> {
        &self.host
    }

    pub fn overlay(&self) -> &Arc<SourceOverlay> {
        &self.overlay
    }

    pub fn aggregator(&self) -> Aggregator<'_> {
        Aggregator {
            host: self.host.as_ref(),
            rewriter: &self.rewriter,
            overlay: &self.overlay,
            bundles: &self.bundles,
            indexing: &self.settings.indexing,
        }
    }

    /// Install dependencies in the background once, if enabled and the first
    /// root has a `package.json`. Projects are reloaded after a successful
    /// install; failures are logged and analysis carries on.
    pub fn start_bootstrap(
        &self,
        client: Option<Client>,
    ) {
        let Some(root) = self.roots.first().cloned() else {
            return;
        };
        if !self.settings.dependencies.install {
            info!("Dependency install disabled");
            return;
        }
        if !bootstrap::has_manifest(&root) {
            info!("No package.json in {}, skipping dependency install", root.display());
            return;
        }
        if self.bootstrap_started.swap(true, Ordering::AcqRel) {
            return;
        }

        let manager = bootstrap::detect_package_manager(&root, self.settings.dependencies.package_manager);
        self.track_install(PendingInstall::spawn(run_install(root, manager, client)));
    }

    /// Take over an install carried from a stopped context, in place of
    /// starting one.
    pub fn adopt_install(
        &self,
        install: PendingInstall,
    ) {
        if self.bootstrap_started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.track_install(install);
    }

    /// Reload this context's projects once `install` succeeds.
    fn track_install(
        &self,
        install: PendingInstall,
    ) {
        let host = Arc::clone(&self.host);
        let overlay = Arc::clone(&self.overlay);
        let installed = install.clone();
        let finisher = tokio::spawn(async move {
            if installed.wait().await {
                overlay.clear();
                if let Err(err) = host.reload_projects().await {
                    warn!("Failed to reload projects after install: {err}");
                }
            }
        });

        if let Ok(mut slot) = self.install.lock() {
            *slot = Some(install);
        }
        if let Ok(mut slot) = self.finisher.lock() {
            *slot = Some(finisher);
        }
    }

    /// Tear the context down. A host passed to [`with_host`](Self::with_host)
    /// belongs to the caller and is left running. An install that has not
    /// finished keeps running and is returned for the next context to adopt.
    pub async fn stop(&self) -> Option<PendingInstall> {
        let finisher = self.finisher.lock().ok().and_then(|mut slot| slot.take());
        if let Some(finisher) = finisher {
            finisher.abort();
        }
        let install = self.install.lock().ok().and_then(|mut slot| slot.take()).filter(|install| !install.is_finished());

        if self.owns_host {
            self.host.shutdown().await;
        }
        info!("Workspace stopped");
        install
    }
}

async fn run_install(
    root: PathBuf,
    manager: PackageManager,
    client: Option<Client>,
) -> bool {
    let progress = match client {
        Some(client) => Some(InstallProgress::start(client, &root, manager).await),
        None => None,
    };

    let (events, mut pending) = mpsc::unbounded_channel();
    let install = bootstrap::install_dependencies(&root, manager, move |event: &InstallEvent| {
        let _ = events.send(event.clone());
    });
    let forward = async {
        while let Some(event) = pending.recv().await {
            if let Some(progress) = &progress {
                progress.event(&event).await;
            }
        }
    };
    let (outcome, ()) = tokio::join!(install, forward);

    if let Err(err) = &outcome {
        warn!("Dependency install in {} failed: {err}", root.display());
    }
    if let Some(progress) = progress {
        progress.finish(&outcome).await;
    }
    outcome.is_ok()
}

async fn apply_workspace_file(
    settings: ServerSettings,
    root: Option<&PathBuf>,
) -> ServerSettings {
    let Some(path) = root.and_then(|root| find_workspace_file(root)) else {
        return settings;
    };
    match load_workspace_file(&path).await {
        Ok(file) => {
            info!("Loaded workspace settings from {}", path.display());
            ServerSettings {
                workspace: settings.workspace.with_file(file),
                ..settings
            }
        },
        Err(err) => {
            warn!("{err}");
            settings
        },
    }
}

#[cfg(test)]
#[path = "../tests/src/workspace_tests.rs"]
mod tests;

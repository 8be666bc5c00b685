use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
    time::Duration,
};

use tokio::sync::oneshot;

use super::*;
use crate::{
    analysis::{DefinitionInfo, NavigationTree, QuickInfo, ReferenceEntry},
    config::WORKSPACE_FILENAME,
};

#[derive(Default)]
struct LifecycleHost {
    reloads: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl LifecycleHost {
    fn reloads(&self) -> usize {
        self.reloads.load(AtomicOrdering::SeqCst)
    }

    fn shutdowns(&self) -> usize {
        self.shutdowns.load(AtomicOrdering::SeqCst)
    }
}

#[tower_lsp::async_trait]
impl AnalysisHost for LifecycleHost {
    async fn ensure_loaded(
        &self,
        _path: &Path,
        _text: &str,
    ) -> Result<(), HostError> {
        Ok(())
    }

    async fn declaration_tree(
        &self,
        _path: &Path,
    ) -> Result<Option<NavigationTree>, HostError> {
        Ok(None)
    }

    async fn quick_info_at(
        &self,
        _path: &Path,
        _offset: usize,
    ) -> Result<Option<QuickInfo>, HostError> {
        Ok(None)
    }

    async fn definition_at(
        &self,
        _path: &Path,
        _offset: usize,
    ) -> Result<Vec<DefinitionInfo>, HostError> {
        Ok(Vec::new())
    }

    async fn references_at(
        &self,
        _path: &Path,
        _offset: usize,
    ) -> Result<Vec<ReferenceEntry>, HostError> {
        Ok(Vec::new())
    }

    async fn reload_projects(&self) -> Result<(), HostError> {
        self.reloads.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    fn compiler_version(&self) -> Option<String> {
        None
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

async fn lifecycle_context(
    root: &Path,
    host: Arc<LifecycleHost>,
) -> WorkspaceContext {
    WorkspaceContext::with_host(vec![root.to_path_buf()], ServerSettings::default(), Arc::new(DocumentStore::new()), host)
        .await
}

async fn wait_for_reloads(
    host: &LifecycleHost,
    expected: usize,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while host.reloads() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("projects should be reloaded");
}

#[tokio::test]
async fn workspace_file_fills_missing_repo() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(
        root.path().join(WORKSPACE_FILENAME),
        r#"
repoUri = "github.com/acme/app"

[[monorepo]]
repo = "github.com/acme/mono"
package = "@acme/ui"
revisionNamespace = "ui@"
pathPrefix = "libs/ui"
"#,
    )
    .unwrap();

    let settings = apply_workspace_file(ServerSettings::default(), Some(&root.path().to_path_buf())).await;
    assert_eq!(settings.workspace.repo_uri.as_deref(), Some("github.com/acme/app"));
    assert_eq!(settings.workspace.monorepos.len(), 1);
}

#[tokio::test]
async fn invalid_workspace_file_keeps_settings() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join(WORKSPACE_FILENAME), "repoUri = [").unwrap();

    let mut settings = ServerSettings::default();
    settings.workspace.repo_uri = Some("github.com/acme/client".to_string());
    let applied = apply_workspace_file(settings.clone(), Some(&root.path().to_path_buf())).await;
    assert_eq!(applied, settings);
}

#[tokio::test]
async fn no_root_means_no_workspace_file() {
    let settings = apply_workspace_file(ServerSettings::default(), None).await;
    assert_eq!(settings, ServerSettings::default());
}

#[tokio::test]
async fn running_install_carries_over_to_the_restarted_context() {
    let root = tempfile::tempdir().unwrap();
    let host = Arc::new(LifecycleHost::default());
    let (finish, finished) = oneshot::channel::<bool>();

    let first = lifecycle_context(root.path(), host.clone()).await;
    first.adopt_install(PendingInstall::spawn(async move { finished.await.unwrap_or(false) }));
    let carried = first.stop().await.expect("unfinished install is handed back");

    let second = lifecycle_context(root.path(), host.clone()).await;
    second.adopt_install(carried.clone());
    finish.send(true).unwrap();

    assert!(carried.wait().await);
    wait_for_reloads(&host, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(host.reloads(), 1);
}

#[tokio::test]
async fn finished_install_is_not_handed_back() {
    let root = tempfile::tempdir().unwrap();
    let host = Arc::new(LifecycleHost::default());
    let context = lifecycle_context(root.path(), host.clone()).await;

    context.adopt_install(PendingInstall::spawn(async { true }));
    wait_for_reloads(&host, 1).await;
    assert!(context.stop().await.is_none());
}

#[tokio::test]
async fn failed_install_does_not_reload() {
    let root = tempfile::tempdir().unwrap();
    let host = Arc::new(LifecycleHost::default());
    let context = lifecycle_context(root.path(), host.clone()).await;

    let install = PendingInstall::spawn(async { false });
    context.adopt_install(install.clone());
    assert!(!install.wait().await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(host.reloads(), 0);
}

#[tokio::test]
async fn cancelled_install_counts_as_failed() {
    let install = PendingInstall::spawn(futures::future::pending::<bool>());
    install.cancel();
    assert!(!install.wait().await);
    assert!(install.is_finished());
}

#[tokio::test]
async fn only_the_first_install_is_tracked() {
    let root = tempfile::tempdir().unwrap();
    let host = Arc::new(LifecycleHost::default());
    let context = lifecycle_context(root.path(), host.clone()).await;

    context.adopt_install(PendingInstall::spawn(async { true }));
    context.adopt_install(PendingInstall::spawn(async { true }));
    wait_for_reloads(&host, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(host.reloads(), 1);
}

#[tokio::test]
async fn caller_owned_hosts_survive_stop() {
    let root = tempfile::tempdir().unwrap();
    let host = Arc::new(LifecycleHost::default());

    let first = lifecycle_context(root.path(), host.clone()).await;
    assert!(first.stop().await.is_none());
    let second = lifecycle_context(root.path(), host.clone()).await;
    second.stop().await;
    assert_eq!(host.shutdowns(), 0);
}

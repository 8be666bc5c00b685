//! [`AnalysisHost`] backed by a `tsserver` child process.

mod protocol;
mod transport;

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
    process::Stdio,
    sync::Mutex,
    time::Duration,
};

use dashmap::DashMap;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, ChildStderr, Command},
};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisHost, DefinitionInfo, HostError, NavigationTree, QuickInfo, ReferenceEntry};
use transport::Connection;

const DEFAULT_ARGS: &[&str] = &["--suppressDiagnosticEvents"];

#[derive(Debug, Clone)]
pub struct TsServerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub request_timeout: Duration,
    /// Used when the server does not report its own version.
    pub compiler_version: Option<String>,
    pub project_root: Option<PathBuf>,
}

impl Default for TsServerConfig {
    fn default() -> Self {
        Self {
            command: "tsserver".to_string(),
            args: Vec::new(),
            request_timeout: Duration::from_secs(30),
            compiler_version: None,
            project_root: None,
        }
    }
}

pub struct TsServerHost {
    connection: Connection,
    child: Mutex<Option<Child>>,
    /// Content fingerprint of every file sent with `open`.
    loaded: DashMap<PathBuf, u64>,
    compiler_version: Option<String>,
    project_root: Option<String>,
}

impl TsServerHost {
    pub async fn spawn(config: TsServerConfig) -> Result<Self, HostError> {
        let mut command = Command::new(&config.command);
        command
            .args(DEFAULT_ARGS)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(root) = &config.project_root {
            command.current_dir(root);
        }

        let mut child = command.spawn().map_err(|source| HostError::Spawn {
            command: config.command.clone(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or(HostError::Closed)?;
        let stdout = child.stdout.take().ok_or(HostError::Closed)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        let connection = Connection::start(stdin, stdout, config.request_timeout);
        let reported = query_version(&connection).await;
        let compiler_version = reported.or(config.compiler_version);
        info!(
            "Started {} (compiler {})",
            config.command,
            compiler_version.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            connection,
            child: Mutex::new(Some(child)),
            loaded: DashMap::new(),
            compiler_version,
            project_root: config.project_root.map(|root| root.to_string_lossy().into_owned()),
        })
    }
}

#[tower_lsp::async_trait]
impl AnalysisHost for TsServerHost {
    async fn ensure_loaded(
        &self,
        path: &Path,
        text: &str,
    ) -> Result<(), HostError> {
        let fingerprint = fingerprint(text);
        let previous = self.loaded.insert(path.to_path_buf(), fingerprint);
        if previous == Some(fingerprint) {
            return Ok(());
        }

        let file = file_name(path);
        if previous.is_some() {
            self.connection.notify("close", Some(protocol::file_arguments(&file)))?;
        }
        debug!("Loading {file} into tsserver");
        let result = self
            .connection
            .notify("open", Some(protocol::open_arguments(&file, text, self.project_root.as_deref())));
        if result.is_err() {
            self.loaded.remove(path);
        }
        result
    }

    async fn declaration_tree(
        &self,
        path: &Path,
    ) -> Result<Option<NavigationTree>, HostError> {
        let body = self.connection.request("navtree-full", Some(protocol::file_arguments(&file_name(path)))).await?;
        body.map(serde_json::from_value).transpose().map_err(HostError::from)
    }

    async fn quick_info_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Option<QuickInfo>, HostError> {
        let body = self
            .connection
            .request("quickinfo-full", Some(protocol::position_arguments(&file_name(path), offset)))
            .await?;
        body.map(protocol::quick_info).transpose().map_err(HostError::from)
    }

    async fn definition_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Vec<DefinitionInfo>, HostError> {
        let body = self
            .connection
            .request("definition-full", Some(protocol::position_arguments(&file_name(path), offset)))
            .await?;
        match body {
            Some(body) => Ok(protocol::definitions(body)?),
            None => Ok(Vec::new()),
        }
    }

    async fn references_at(
        &self,
        path: &Path,
        offset: usize,
    ) -> Result<Vec<ReferenceEntry>, HostError> {
        let body = self
            .connection
            .request("references-full", Some(protocol::position_arguments(&file_name(path), offset)))
            .await?;
        match body {
            Some(body) => Ok(protocol::references(body)?),
            None => Ok(Vec::new()),
        }
    }

    async fn reload_projects(&self) -> Result<(), HostError> {
        // Files are re-sent on next use so the reloaded projects see them.
        self.loaded.clear();
        self.connection.notify("reloadProjects", None)
    }

    fn compiler_version(&self) -> Option<String> {
        self.compiler_version.clone()
    }

    async fn shutdown(&self) {
        let _ = self.connection.notify("exit", None);
        let child = self.child.lock().ok().and_then(|mut guard| guard.take());
        if let Some(mut child) = child {
            match tokio::time::timeout(Duration::from_secs(2), child.wait()).await {
                Ok(_) => debug!("tsserver exited"),
                Err(_) => {
                    if let Err(error) = child.kill().await {
                        warn!("Failed to stop tsserver: {error}");
                    }
                },
            }
        }
    }
}

async fn query_version(connection: &Connection) -> Option<String> {
    match connection.request("status", None).await {
        Ok(Some(body)) => serde_json::from_value::<protocol::StatusBody>(body).ok()?.version,
        Ok(None) => None,
        Err(error) => {
            debug!("tsserver did not report a version: {error}");
            None
        },
    }
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("[tsserver] {line}");
    }
}

fn file_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "../../../tests/src/analysis/tsserver_tests.rs"]
mod tests;

//! One-shot dependency install that materializes `node_modules` before
//! analysis. Failures are reported to the caller and never abort the server.

use std::{
    future::Future,
    path::Path,
    process::{ExitStatus, Stdio},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    task::AbortHandle,
};
use tracing::{debug, info, warn};

use crate::{config::PackageManager, package::MANIFEST_FILENAME};

const YARN_LOCKFILE: &str = "yarn.lock";
const NPM_LOCKFILES: &[&str] = &["package-lock.json", "npm-shrinkwrap.json"];

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("{0} is not available")]
    CommandNotFound(String),

    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whether `root` declares dependencies at all.
pub fn has_manifest(root: &Path) -> bool {
    root.join(MANIFEST_FILENAME).is_file()
}

/// Lockfiles decide the tool; `fallback` applies when there is none.
pub fn detect_package_manager(
    root: &Path,
    fallback: PackageManager,
) -> PackageManager {
    if root.join(YARN_LOCKFILE).is_file() {
        return PackageManager::Yarn;
    }
    if NPM_LOCKFILES.iter().any(|lockfile| root.join(lockfile).is_file()) {
        return PackageManager::Npm;
    }
    fallback
}

/// Non-interactive install with scripts and engine checks disabled and
/// machine-readable output.
pub fn install_args(manager: PackageManager) -> &'static [&'static str] {
    match manager {
        PackageManager::Yarn => {
            &["install", "--json", "--ignore-scripts", "--no-progress", "--ignore-engines", "--non-interactive"]
        },
        PackageManager::Npm => &[
            "install",
            "--json",
            "--ignore-scripts",
            "--no-progress",
            "--engine-strict=false",
            "--no-audit",
            "--no-fund",
        ],
    }
}

/// One structured line of package-manager output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    Step {
        message: String,
        current: u64,
        total: u64,
    },
    Info(String),
    Warning(String),
    Error(String),
}

impl InstallEvent {
    /// Step progress as a percentage.
    pub fn percentage(&self) -> Option<u32> {
        match self {
            Self::Step {
                current,
                total,
                ..
            } if *total > 0 => Some(((*current).min(*total) * 100 / *total) as u32),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    message: String,
    #[serde(default)]
    current: u64,
    #[serde(default)]
    total: u64,
}

/// Parse a `--json` output line. Lines that are not events (npm prints a
/// single summary document) yield `None`.
pub fn parse_install_line(line: &str) -> Option<InstallEvent> {
    let raw = serde_json::from_str::<RawLine>(line.trim()).ok()?;
    let text = || match &raw.data {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    match raw.kind.as_str() {
        "step" => {
            let step = serde_json::from_value::<RawStep>(raw.data.clone()).ok()?;
            Some(InstallEvent::Step {
                message: step.message,
                current: step.current,
                total: step.total,
            })
        },
        "warning" => Some(InstallEvent::Warning(text())),
        "error" => Some(InstallEvent::Error(text())),
        "info" | "success" | "activityStart" | "activityTick" | "activityEnd" => Some(InstallEvent::Info(text())),
        _ => None,
    }
}

fn log_event(
    command: &str,
    event: &InstallEvent,
) {
    match event {
        InstallEvent::Step {
            message,
            current,
            total,
        } => info!("{command} [{current}/{total}] {message}"),
        InstallEvent::Info(message) => debug!("{command}: {message}"),
        InstallEvent::Warning(message) => warn!("{command}: {message}"),
        InstallEvent::Error(message) => warn!("{command} error: {message}"),
    }
}

/// Run the install in `root`, handing every stdout event to `on_event`.
pub async fn install_dependencies<F>(
    root: &Path,
    manager: PackageManager,
    mut on_event: F,
) -> Result<(), BootstrapError>
where
    F: FnMut(&InstallEvent),
{
    let command = manager.command();
    let args = install_args(manager);
    info!("Installing dependencies in {} with {command} {}", root.display(), args.join(" "));

    let mut child = Command::new(command)
        .args(args)
        .current_dir(root)
        .env("TERM", "dumb")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => BootstrapError::CommandNotFound(command.to_string()),
            _ => BootstrapError::Launch {
                command: command.to_string(),
                source: error,
            },
        })?;

    let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(drain_stderr(command, stderr)));

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_install_line(&line) {
                Some(event) => {
                    log_event(command, &event);
                    on_event(&event);
                },
                None if !line.trim().is_empty() => debug!("{command}: {line}"),
                None => {},
            }
        }
    }

    let status = child.wait().await?;
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    if !status.success() {
        return Err(BootstrapError::Failed {
            command: command.to_string(),
            status,
        });
    }
    info!("{command} finished installing dependencies");
    Ok(())
}

async fn drain_stderr(
    command: &'static str,
    stderr: impl AsyncRead + Unpin,
) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_install_line(&line) {
            Some(event) => log_event(command, &event),
            None if !line.trim().is_empty() => debug!("{command} stderr: {line}"),
            None => {},
        }
    }
}

/// An install running on its own task. Clones observe the same install, and
/// dropping them leaves the install running.
#[derive(Clone)]
pub struct PendingInstall {
    installed: Shared<BoxFuture<'static, bool>>,
    abort: AbortHandle,
}

impl PendingInstall {
    /// Run `install` on a new task; it resolves to whether the install
    /// succeeded.
    pub fn spawn<F>(install: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(install);
        let abort = handle.abort_handle();
        Self {
            installed: handle.map(|joined| joined.unwrap_or(false)).boxed().shared(),
            abort,
        }
    }

    /// `true` once the outcome has been observed by some waiter.
    pub fn is_finished(&self) -> bool {
        self.installed.peek().is_some()
    }

    /// Whether the install succeeded. A cancelled install counts as failed.
    pub async fn wait(&self) -> bool {
        self.installed.clone().await
    }

    pub fn cancel(&self) {
        self.abort.abort();
    }
}

#[cfg(test)]
#[path = "../tests/src/bootstrap_tests.rs"]
mod tests;

//! `$/progress` reporting for the dependency install.
//!
//! One [`InstallProgress`] follows one install: a `Begin` naming the package
//! manager, a `Report` per install step, and an `End` carrying the outcome.

use std::{
    panic::AssertUnwindSafe,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::FutureExt;
use tower_lsp::{Client, lsp_types::*};
use tracing::{debug, warn};

use crate::{
    bootstrap::{BootstrapError, InstallEvent},
    config::PackageManager,
};

static NEXT_INSTALL_ID: AtomicU64 = AtomicU64::new(1);
const INSTALL_TITLE: &str = "xref-analyzer: Installing dependencies";

/// Progress session of a running install. Dropping it before
/// [`finish`](Self::finish) ends the session as cancelled.
pub struct InstallProgress {
    client: Client,
    token: NumberOrString,
    finished: bool,
}

impl InstallProgress {
    /// Ask the client for a progress token and send `Begin`. The begin
    /// notification goes out even when the client rejects the token.
    pub async fn start(
        client: Client,
        root: &Path,
        manager: PackageManager,
    ) -> Self {
        let id = NEXT_INSTALL_ID.fetch_add(1, Ordering::Relaxed);
        let token = NumberOrString::String(format!("xrefAnalyzer/install/{id}"));

        // tower-lsp panics if the create response is dropped unread.
        let create_client = client.clone();
        let create_token = token.clone();
        tokio::spawn(async move {
            let created = AssertUnwindSafe(create_client.send_request::<request::WorkDoneProgressCreate>(
                WorkDoneProgressCreateParams {
                    token: create_token,
                },
            ))
            .catch_unwind()
            .await;
            match created {
                Ok(Ok(())) => {},
                Ok(Err(error)) => debug!("workDoneProgress/create rejected: {error}"),
                Err(_) => warn!("workDoneProgress/create panicked (client may have disconnected)"),
            }
        });

        let progress = Self {
            client,
            token,
            finished: false,
        };
        progress.send(WorkDoneProgress::Begin(begin_payload(root, manager))).await;
        progress
    }

    /// Forward an install event. Only steps are shown to the user.
    pub async fn event(
        &self,
        event: &InstallEvent,
    ) {
        if let Some(report) = report_payload(event) {
            self.send(WorkDoneProgress::Report(report)).await;
        }
    }

    pub async fn finish(
        mut self,
        outcome: &Result<(), BootstrapError>,
    ) {
        self.finished = true;
        self.send(WorkDoneProgress::End(WorkDoneProgressEnd {
            message: Some(end_message(outcome)),
        }))
        .await;
    }

    async fn send(
        &self,
        value: WorkDoneProgress,
    ) {
        let sent = AssertUnwindSafe(self.client.send_notification::<notification::Progress>(ProgressParams {
            token: self.token.clone(),
            value: ProgressParamsValue::WorkDone(value),
        }))
        .catch_unwind()
        .await;
        if sent.is_err() {
            warn!("$/progress notification panicked (client may have disconnected)");
        }
    }
}

impl Drop for InstallProgress {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("Install progress {:?} dropped before the install finished", self.token);
        let client = self.client.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(ProgressParams {
                token,
                value: ProgressParamsValue::WorkDone(WorkDoneProgress::End(WorkDoneProgressEnd {
                    message: Some("Install cancelled".to_string()),
                })),
            }))
            .catch_unwind()
            .await;
        });
    }
}

fn begin_payload(
    root: &Path,
    manager: PackageManager,
) -> WorkDoneProgressBegin {
    WorkDoneProgressBegin {
        title: INSTALL_TITLE.to_string(),
        cancellable: Some(false),
        message: Some(format!("{} install in {}", manager.command(), root.display())),
        percentage: Some(0),
    }
}

fn report_payload(event: &InstallEvent) -> Option<WorkDoneProgressReport> {
    let InstallEvent::Step {
        message,
        ..
    } = event
    else {
        return None;
    };
    Some(WorkDoneProgressReport {
        cancellable: Some(false),
        message: Some(message.clone()),
        percentage: event.percentage(),
    })
}

fn end_message(outcome: &Result<(), BootstrapError>) -> String {
    match outcome {
        Ok(()) => "Dependencies installed".to_string(),
        Err(err) => format!("Dependency install failed: {err}"),
    }
}

#[cfg(test)]
#[path = "../tests/src/progress_tests.rs"]
mod tests;

//! Handlers for the extension requests registered with
//! `LspService::build(..).custom_method(..)`.

use std::{panic::AssertUnwindSafe, time::Instant};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower_lsp::{
    jsonrpc::Result,
    lsp_types::{ProgressToken, TextDocumentPositionParams},
};
use tracing::{info, warn};

use crate::{
    lsp_ext::{FullParams, PartialResult, PartialResultParamsValue, PatchOperation, PatchStream, SymbolLocator},
    server::state::XrefLanguageServer,
};

impl XrefLanguageServer {
    /// `textDocument/full`: symbols and references of one file.
    ///
    /// The result is the reduced patch document, `[Full]` or `[]`. With a
    /// partial result token every patch operation is also sent as
    /// `$/partialResult` as soon as it is produced.
    pub async fn full(
        &self,
        params: FullParams,
    ) -> Result<Value> {
        let uri = params.text_document.uri.clone();
        let reference = params.wants_references();
        let token = params.partial_result_token().cloned();
        let started = Instant::now();

        let (sink, mut operations) = mpsc::unbounded_channel();
        let workspace = self.workspace().await;
        let produce = async move {
            match &workspace {
                Some(workspace) => workspace.aggregator().full(&uri, reference, &sink).await,
                None => {
                    let _ = sink.send(PatchOperation::initialize_empty());
                },
            }
        };

        let consume = async {
            let mut stream = PatchStream::new();
            while let Some(operation) = operations.recv().await {
                if let Some(token) = &token {
                    self.send_partial_result(token, &operation).await;
                }
                if !stream.apply(&operation) {
                    warn!("Dropped patch operation {} {}", operation.op, operation.path);
                }
            }
            stream
        };

        let ((), stream) = tokio::join!(produce, consume);
        info!(
            "textDocument/full {} (references: {reference}) answered with {} operation(s) in {:?}",
            params.text_document.uri,
            stream.applied(),
            started.elapsed()
        );
        Ok(stream.into_value())
    }

    /// `textDocument/edefinition`: canonical locators for the symbol under
    /// the cursor.
    pub async fn edefinition(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Vec<SymbolLocator>> {
        let Some(workspace) = self.workspace().await else {
            return Ok(Vec::new());
        };
        Ok(workspace.aggregator().locate_definitions(&params.text_document.uri, params.position).await)
    }

    async fn send_partial_result(
        &self,
        token: &ProgressToken,
        operation: &PatchOperation,
    ) {
        let params = PartialResultParamsValue {
            id: token.clone(),
            patch: vec![operation.clone()],
        };
        let sent = AssertUnwindSafe(self.client.send_notification::<PartialResult>(params)).catch_unwind().await;
        if sent.is_err() {
            warn!("$/partialResult notification panicked (client may have disconnected)");
        }
    }
}

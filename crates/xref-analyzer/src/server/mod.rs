pub(crate) mod ext;
pub(crate) mod handler;
pub(crate) mod state;

pub use state::XrefLanguageServer;

use tower_lsp::{ClientSocket, LspService};

use crate::lsp_ext::{EDEFINITION_METHOD, FULL_METHOD};

/// Build the service with the extension requests registered.
pub fn build_service<F>(init: F) -> (LspService<XrefLanguageServer>, ClientSocket)
where
    F: FnOnce(tower_lsp::Client) -> XrefLanguageServer,
{
    LspService::build(init)
        .custom_method(FULL_METHOD, XrefLanguageServer::full)
        .custom_method(EDEFINITION_METHOD, XrefLanguageServer::edefinition)
        .finish()
}

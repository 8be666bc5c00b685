pub mod aggregator;
pub mod analysis;
pub mod bootstrap;
pub mod canonical;
pub mod config;
pub mod document;
pub mod lsp_ext;
pub mod package;
pub mod progress;
pub mod qname;
pub mod server;
pub mod text_pos;
pub mod vfs;
pub mod walker;
pub mod workspace;

pub use aggregator::Aggregator;
pub use analysis::{AnalysisHost, HostError, TsServerHost};
pub use canonical::{CanonicalLocation, CanonicalRewriter};
pub use lsp_ext::{Full, FullParams, Reference, SymbolLocator};
pub use qname::{SymbolDescriptor, qname};
pub use server::{XrefLanguageServer, build_service};
pub use workspace::WorkspaceContext;

mod document_store;
mod text_document;

pub use document_store::DocumentStore;
pub use text_document::Document;

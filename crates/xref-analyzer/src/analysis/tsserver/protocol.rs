use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::types::{DefinitionInfo, QuickInfo, ReferenceEntry};

#[derive(Debug, Serialize)]
pub(super) struct Request<'a> {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl<'a> Request<'a> {
    pub fn new(
        seq: u64,
        command: &'a str,
        arguments: Option<Value>,
    ) -> Self {
        Self {
            seq,
            kind: "request",
            command,
            arguments,
        }
    }
}

/// A response or event from the server. `request_seq` is snake_case on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub request_seq: Option<u64>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SymbolDisplayPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuickInfoBody {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    kind_modifiers: String,
    #[serde(default)]
    display_parts: Vec<SymbolDisplayPart>,
    #[serde(default)]
    documentation: Vec<SymbolDisplayPart>,
}

#[derive(Debug, Deserialize)]
struct ReferencedSymbol {
    #[serde(default)]
    references: Vec<ReferenceEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusBody {
    pub version: Option<String>,
}

pub(super) fn file_arguments(file: &str) -> Value {
    serde_json::json!({ "file": file })
}

pub(super) fn position_arguments(
    file: &str,
    position: usize,
) -> Value {
    serde_json::json!({ "file": file, "position": position })
}

pub(super) fn open_arguments(
    file: &str,
    content: &str,
    project_root: Option<&str>,
) -> Value {
    let mut arguments = serde_json::json!({ "file": file, "fileContent": content });
    if let Some(root) = project_root {
        arguments["projectRootPath"] = Value::String(root.to_string());
    }
    arguments
}

pub(super) fn quick_info(body: Value) -> Result<QuickInfo, serde_json::Error> {
    let body: QuickInfoBody = serde_json::from_value(body)?;
    Ok(QuickInfo {
        kind: body.kind,
        kind_modifiers: body.kind_modifiers,
        display: join_parts(&body.display_parts),
        documentation: join_parts(&body.documentation),
    })
}

pub(super) fn definitions(body: Value) -> Result<Vec<DefinitionInfo>, serde_json::Error> {
    serde_json::from_value(body)
}

pub(super) fn references(body: Value) -> Result<Vec<ReferenceEntry>, serde_json::Error> {
    let symbols: Vec<ReferencedSymbol> = serde_json::from_value(body)?;
    Ok(symbols.into_iter().flat_map(|symbol| symbol.references).collect())
}

fn join_parts(parts: &[SymbolDisplayPart]) -> String {
    parts.iter().map(|part| part.text.as_str()).collect()
}

//! Append-only JSON patch documents used to stream extension responses.
//!
//! A response is a sequence of `add` operations: the first initializes the
//! document (`path: ""`), later ones append to it (`path: "/-"`). Streaming
//! clients receive each operation as a `$/partialResult` notification; the
//! final JSON-RPC response carries the reduced document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::{ProgressToken, notification::Notification};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    pub fn add(
        path: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            op: "add".to_string(),
            path: path.into(),
            value,
        }
    }

    /// The operation that starts every streamed response: an empty array.
    pub fn initialize_empty() -> Self {
        Self::add("", Value::Array(Vec::new()))
    }

    pub fn append(value: Value) -> Self {
        Self::add("/-", value)
    }
}

/// Reduces a stream of operations to the document they describe.
#[derive(Debug, Default)]
pub struct PatchStream {
    document: Option<Value>,
    applied: usize,
}

impl PatchStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Apply one operation. Operations other than `add`, and pointers that do
    /// not resolve, are ignored and reported as `false`.
    pub fn apply(
        &mut self,
        operation: &PatchOperation,
    ) -> bool {
        if operation.op != "add" {
            return false;
        }

        if operation.path.is_empty() {
            self.document = Some(operation.value.clone());
            self.applied += 1;
            return true;
        }

        let Some(root) = self.document.as_mut() else {
            return false;
        };
        let Some(tokens) = operation.path.strip_prefix('/') else {
            return false;
        };
        let tokens = tokens.split('/').map(unescape_token).collect::<Vec<_>>();
        let Some((last, parents)) = tokens.split_last() else {
            return false;
        };

        let mut target = root;
        for token in parents {
            let next = match target {
                Value::Object(map) => map.get_mut(token.as_str()),
                Value::Array(items) => token.parse::<usize>().ok().and_then(|idx| items.get_mut(idx)),
                _ => None,
            };
            let Some(next) = next else {
                return false;
            };
            target = next;
        }

        let inserted = match target {
            Value::Array(items) if last == "-" => {
                items.push(operation.value.clone());
                true
            },
            Value::Array(items) => match last.parse::<usize>() {
                Ok(idx) if idx <= items.len() => {
                    items.insert(idx, operation.value.clone());
                    true
                },
                _ => false,
            },
            Value::Object(map) => {
                map.insert(last.clone(), operation.value.clone());
                true
            },
            _ => false,
        };
        if inserted {
            self.applied += 1;
        }
        inserted
    }

    pub fn into_value(self) -> Value {
        self.document.unwrap_or(Value::Null)
    }
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialResultParamsValue {
    pub id: ProgressToken,
    pub patch: Vec<PatchOperation>,
}

/// `$/partialResult` notification carrying patch operations for a request.
#[derive(Debug)]
pub enum PartialResult {}

impl Notification for PartialResult {
    type Params = PartialResultParamsValue;
    const METHOD: &'static str = super::PARTIAL_RESULT_METHOD;
}

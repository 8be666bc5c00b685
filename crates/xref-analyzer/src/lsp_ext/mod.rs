//! Wire types for the `textDocument/full` and `textDocument/edefinition`
//! extension requests.

mod patch;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tower_lsp::lsp_types::{
    HoverContents, Location, PartialResultParams, ProgressToken, SymbolInformation, SymbolKind,
    TextDocumentIdentifier,
};

pub use patch::{PatchOperation, PatchStream, PartialResult, PartialResultParamsValue};

pub const FULL_METHOD: &str = "textDocument/full";
pub const EDEFINITION_METHOD: &str = "textDocument/edefinition";
pub const PARTIAL_RESULT_METHOD: &str = "$/partialResult";

/// Identifies a package independently of where it is installed on disk.
///
/// `name` may differ from the repository name, and `version` is not always
/// meaningful: one repository can publish several packages, in which case
/// `repo_uri` plus the qualified name identify the symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLocator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_uri: Option<String>,
}

impl PackageLocator {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.repo_uri.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullParams {
    pub text_document: TextDocumentIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<bool>,
    #[serde(flatten)]
    pub partial_result_params: PartialResultParams,
}

impl FullParams {
    pub fn wants_references(&self) -> bool {
        self.reference.unwrap_or(false)
    }

    pub fn partial_result_token(&self) -> Option<&ProgressToken> {
        self.partial_result_params.partial_result_token.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSymbolInformation {
    pub symbol_information: SymbolInformation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qname: Option<String>,
    /// Hover-style documentation for the symbol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<HoverContents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageLocator>,
}

/// Canonical, location-rewritten identity of a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolLocator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_kind: Option<SymbolKind>,
    /// Path of the declaring file inside its repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageLocator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferenceCategory {
    #[default]
    Uncategorized,
    Read,
    Write,
    Inherit,
    Implement,
}

impl ReferenceCategory {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Uncategorized => 0,
            Self::Read => 1,
            Self::Write => 2,
            Self::Inherit => 3,
            Self::Implement => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uncategorized),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::Inherit),
            4 => Some(Self::Implement),
            _ => None,
        }
    }
}

impl Serialize for ReferenceCategory {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ReferenceCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown reference category {value}")))
    }
}

/// A single identifier use in the requested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub category: ReferenceCategory,
    pub location: Location,
    pub target: SymbolLocator,
}

/// Complete response for one file.
///
/// `None` means the list was not computed; `Some(vec![])` means it was
/// computed and nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Full {
    pub symbols: Option<Vec<DetailSymbolInformation>>,
    pub references: Option<Vec<Reference>>,
}

#[cfg(test)]
#[path = "../../tests/src/lsp_ext/lsp_ext_tests.rs"]
mod tests;

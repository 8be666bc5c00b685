use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Yarn,
    Npm,
}

impl PackageManager {
    pub fn command(self) -> &'static str {
        match self {
            Self::Yarn => "yarn",
            Self::Npm => "npm",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencySettings {
    /// Install dependencies once after the workspace opens.
    pub install: bool,
    /// Used when the workspace has no lockfile.
    pub package_manager: PackageManager,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            install: true,
            package_manager: PackageManager::Yarn,
        }
    }
}

impl DependencySettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: DependencySettingsPatch,
    ) {
        if let Some(v) = patch.install {
            self.install = v;
        }
        if let Some(v) = patch.package_manager {
            self.package_manager = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DependencySettingsPatch {
    pub(crate) install: Option<bool>,
    pub(crate) package_manager: Option<PackageManager>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}

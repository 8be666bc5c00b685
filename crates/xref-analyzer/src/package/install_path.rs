use std::path::{Component, Path, PathBuf};

pub const DEPENDENCY_DIR: &str = "node_modules";

/// A file path split at its innermost `node_modules/<package>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPath {
    /// `…/node_modules/<package>` (two segments for scoped packages).
    pub package_root: PathBuf,
    /// Package directory name as installed, e.g. `lodash` or `@types/node`.
    pub package_dir: String,
    /// Remaining path inside the package, `/`-separated.
    pub within_package: String,
}

impl DependencyPath {
    pub fn parse(path: &Path) -> Option<Self> {
        let components = path.components().collect::<Vec<_>>();
        let marker = components
            .iter()
            .rposition(|component| matches!(component, Component::Normal(name) if *name == DEPENDENCY_DIR))?;

        let first = component_str(components.get(marker + 1)?)?;
        let (package_dir, consumed) = if first.starts_with('@') {
            let second = component_str(components.get(marker + 2)?)?;
            (format!("{first}/{second}"), 2)
        } else {
            (first.to_string(), 1)
        };

        let package_root = components[..=marker + consumed].iter().collect::<PathBuf>();
        let within_package = components[marker + consumed + 1..]
            .iter()
            .filter_map(component_str)
            .collect::<Vec<_>>()
            .join("/");

        Some(Self {
            package_root,
            package_dir,
            within_package,
        })
    }
}

/// Whether `path` lives inside a dependency-install directory.
pub fn is_dependency_path(path: &Path) -> bool {
    path.components().any(|component| matches!(component, Component::Normal(name) if name == DEPENDENCY_DIR))
}

fn component_str<'a>(component: &'a Component<'a>) -> Option<&'a str> {
    match component {
        Component::Normal(name) => name.to_str(),
        _ => None,
    }
}

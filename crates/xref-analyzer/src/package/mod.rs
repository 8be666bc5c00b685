//! Package ownership of files.

mod install_path;
mod manifest;
mod resolver;

pub use install_path::{DEPENDENCY_DIR, DependencyPath, is_dependency_path};
pub use manifest::{MANIFEST_FILENAME, ManifestError, PackageManifest, parse_manifest, read_manifest};
pub use resolver::{PackageCache, PackageResolver, ResolvedPackage};

#[cfg(test)]
#[path = "../../tests/src/package/package_tests.rs"]
mod tests;

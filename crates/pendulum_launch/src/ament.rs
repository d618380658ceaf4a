//! Package index lookups against the ament resource index

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable listing the install prefixes, highest priority first
pub const AMENT_PREFIX_PATH: &str = "AMENT_PREFIX_PATH";

/// Marker directory for registered packages, relative to a prefix
const PACKAGES_RESOURCE: &str = "share/ament_index/resource_index/packages";

/// Resolves installed package locations
pub trait PackageIndex {
    /// Installed share directory of a package
    fn resolve_share_dir(&self, package: &str) -> Result<PathBuf, PackageNotFoundError>;

    /// Directory holding the package's executables.
    ///
    /// Derived from the share directory: `<prefix>/share/<pkg>` maps to
    /// `<prefix>/lib/<pkg>`.
    fn resolve_lib_dir(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        let share_dir = self.resolve_share_dir(package)?;
        let prefix = share_dir
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| PackageNotFoundError::new(package))?;
        Ok(prefix.join("lib").join(package))
    }
}

/// Index backed by the ament resource index of one or more install prefixes
#[derive(Debug, Clone, Default)]
pub struct AmentIndex {
    prefixes: Vec<PathBuf>,
}

impl AmentIndex {
    /// Create an index over explicit prefixes, searched in order
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an index from `AMENT_PREFIX_PATH`
    pub fn from_env() -> Self {
        match std::env::var_os(AMENT_PREFIX_PATH) {
            Some(value) => Self::from_path_list(&value),
            None => {
                log::warn!("{} is not set, no packages can be resolved", AMENT_PREFIX_PATH);
                Self::default()
            }
        }
    }

    /// Parse a platform path list, skipping empty entries
    pub fn from_path_list(value: &OsStr) -> Self {
        Self::new(std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()))
    }

    /// Configured prefixes
    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    /// First prefix registering the package
    pub fn find_prefix(&self, package: &str) -> Option<&Path> {
        if package.is_empty() || package.contains(|c: char| c == '/' || c == '\\') {
            return None;
        }
        self.prefixes
            .iter()
            .find(|prefix| prefix.join(PACKAGES_RESOURCE).join(package).is_file())
            .map(PathBuf::as_path)
    }
}

impl PackageIndex for AmentIndex {
    fn resolve_share_dir(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        let prefix = self
            .find_prefix(package)
            .ok_or_else(|| PackageNotFoundError::new(package))?;
        log::debug!("Package '{}' found in prefix {}", package, prefix.display());
        Ok(prefix.join("share").join(package))
    }

    fn resolve_lib_dir(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        let prefix = self
            .find_prefix(package)
            .ok_or_else(|| PackageNotFoundError::new(package))?;
        Ok(prefix.join("lib").join(package))
    }
}

/// In-memory index mapping package names to share directories
#[derive(Debug, Clone, Default)]
pub struct MapIndex {
    share_dirs: HashMap<String, PathBuf>,
}

impl MapIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package share directory
    pub fn with_package(mut self, package: impl Into<String>, share_dir: impl Into<PathBuf>) -> Self {
        self.share_dirs.insert(package.into(), share_dir.into());
        self
    }
}

impl PackageIndex for MapIndex {
    fn resolve_share_dir(&self, package: &str) -> Result<PathBuf, PackageNotFoundError> {
        self.share_dirs
            .get(package)
            .cloned()
            .ok_or_else(|| PackageNotFoundError::new(package))
    }
}

/// Locate an executable installed by a package
pub fn resolve_executable(
    index: &dyn PackageIndex,
    package: &str,
    executable: &str,
) -> Result<PathBuf, ExecutableError> {
    let path = index.resolve_lib_dir(package)?.join(executable);
    if !path.is_file() {
        return Err(ExecutableError::NotFound {
            package: package.to_string(),
            executable: executable.to_string(),
            path,
        });
    }
    Ok(path)
}

/// The package index has no entry for the package
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Package '{package}' not found in the package index")]
pub struct PackageNotFoundError {
    pub package: String,
}

impl PackageNotFoundError {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }
}

/// Errors that can occur when locating an executable
#[derive(Debug, thiserror::Error)]
pub enum ExecutableError {
    #[error(transparent)]
    PackageNotFound(#[from] PackageNotFoundError),

    #[error("Executable '{executable}' not found in package '{package}' (looked at {})", .path.display())]
    NotFound {
        package: String,
        executable: String,
        path: PathBuf,
    },
}

//! Robot description resource resolution and loading

use crate::ament::{PackageIndex, PackageNotFoundError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Absolute location of a resource inside a package's share directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    path: PathBuf,
}

impl ResourceLocation {
    /// Resolve `<share_dir>/<relative>` for a package
    pub fn resolve(
        index: &dyn PackageIndex,
        package: &str,
        relative: impl AsRef<Path>,
    ) -> Result<Self, PackageNotFoundError> {
        let share_dir = index.resolve_share_dir(package)?;
        Ok(Self {
            path: share_dir.join(relative),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Full text of a robot description file (URDF), treated as opaque
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionText(String);

impl DescriptionText {
    /// Read the whole resource as UTF-8
    pub fn read(location: &ResourceLocation) -> Result<Self, ResourceReadError> {
        let text = std::fs::read_to_string(location.path()).map_err(|e| ResourceReadError {
            path: location.path().to_path_buf(),
            source: e,
        })?;
        log::debug!("Read {} bytes from {}", text.len(), location);
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// The resource is missing, unreadable, or not valid UTF-8
#[derive(Debug, thiserror::Error)]
#[error("Failed to read '{}': {source}", .path.display())]
pub struct ResourceReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl ResourceReadError {
    /// Underlying I/O error kind
    pub fn kind(&self) -> std::io::ErrorKind {
        self.source.kind()
    }
}

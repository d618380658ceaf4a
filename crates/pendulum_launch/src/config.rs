//! Assembler configuration schema

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Package that installs the pendulum description
pub const DEFAULT_PACKAGE: &str = "inverted_pendulum_description";

/// Static settings for assembling a launch plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblerConfig {
    /// Package whose share directory holds the description
    #[serde(default = "default_package")]
    pub package: String,

    /// Subdirectory of the share directory
    #[serde(default = "default_description_dir")]
    pub description_dir: String,

    /// Description file name
    #[serde(default = "default_description_file")]
    pub description_file: String,

    /// Also emit the rviz2 and joint_state_publisher nodes
    #[serde(default)]
    pub include_debug_nodes: bool,
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_description_dir() -> String {
    "urdf".to_string()
}

fn default_description_file() -> String {
    "pendulum.urdf".to_string()
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            description_dir: default_description_dir(),
            description_file: default_description_file(),
            include_debug_nodes: false,
        }
    }
}

impl AssemblerConfig {
    /// Default configuration for another package
    pub fn for_package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AssemblerConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Description path relative to the share directory
    pub fn description_path(&self) -> PathBuf {
        Path::new(&self.description_dir).join(&self.description_file)
    }

    /// Split a relative path into directory and file name
    pub fn set_description_path(&mut self, relative: &str) -> Result<(), ConfigError> {
        let path = Path::new(relative);
        let file = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| {
                ConfigError::Validation(format!("'{}' does not name a file", relative))
            })?;
        let dir = path
            .parent()
            .and_then(|d| d.to_str())
            .unwrap_or_default();
        let candidate = Self {
            description_dir: dir.to_string(),
            description_file: file.to_string(),
            ..self.clone()
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.package.trim().is_empty() {
            return Err(ConfigError::Validation(
                "'package' must not be empty".to_string(),
            ));
        }
        if self.description_file.is_empty() {
            return Err(ConfigError::Validation(
                "'description_file' must not be empty".to_string(),
            ));
        }

        // The description must stay inside the share directory
        let relative = self.description_path();
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(ConfigError::Validation(format!(
                        "description path '{}' must not contain '..'",
                        relative.display()
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ConfigError::Validation(format!(
                        "description path '{}' must be relative",
                        relative.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Errors that can occur when loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssemblerConfig::default();
        assert_eq!(config.package, "inverted_pendulum_description");
        assert_eq!(config.description_path(), PathBuf::from("urdf/pendulum.urdf"));
        assert!(!config.include_debug_nodes);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
package: my_robot_description
include_debug_nodes: true
"#;
        let config = AssemblerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.package, "my_robot_description");
        assert_eq!(config.description_file, "pendulum.urdf");
        assert!(config.include_debug_nodes);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = AssemblerConfig::from_yaml("packag: typo\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parent_dir_rejected() {
        let yaml = r#"
description_dir: "../other"
"#;
        let result = AssemblerConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_absolute_dir_rejected() {
        let mut config = AssemblerConfig::default();
        config.description_dir = "/etc".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_package_rejected() {
        let result = AssemblerConfig::from_yaml("package: \"\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_set_description_path() {
        let mut config = AssemblerConfig::default();
        config.set_description_path("robots/cart.urdf").unwrap();
        assert_eq!(config.description_dir, "robots");
        assert_eq!(config.description_file, "cart.urdf");

        config.set_description_path("flat.urdf").unwrap();
        assert_eq!(config.description_dir, "");
        assert_eq!(config.description_path(), PathBuf::from("flat.urdf"));

        assert!(config.set_description_path("urdf/..").is_err());
    }
}

//! Command-line interface for pendulum_launch

use crate::config::{AssemblerConfig, ConfigError, DEFAULT_PACKAGE};
use argh::FromArgs;
use std::str::FromStr;
use std::time::Duration;

/// Display the inverted pendulum: static transform and robot state publisher
#[derive(FromArgs, Debug)]
pub struct LaunchArgs {
    /// package installing the robot description (default: inverted_pendulum_description)
    #[argh(positional, default = "String::from(DEFAULT_PACKAGE)")]
    pub package: String,

    /// assembler configuration file (YAML)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    /// description path relative to the package share directory (default: urdf/pendulum.urdf)
    #[argh(option)]
    pub description: Option<String>,

    /// also launch rviz2 and joint_state_publisher
    #[argh(switch)]
    pub with_debug_nodes: bool,

    /// show launch plan without executing
    #[argh(switch)]
    pub dry_run: bool,

    /// launch plan output format for --dry-run (text, yaml, json)
    #[argh(option, default = "PlanFormat::Text")]
    pub format: PlanFormat,

    /// directory for node log files (default: $ROS_LOG_DIR or ~/.ros/log)
    #[argh(option)]
    pub log_dir: Option<String>,

    /// grace period before killing a node on shutdown, in milliseconds
    #[argh(option, default = "5000")]
    pub shutdown_timeout_ms: u64,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// How `--dry-run` prints the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Text,
    Yaml,
    Json,
}

impl FromStr for PlanFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(PlanFormat::Text),
            "yaml" => Ok(PlanFormat::Yaml),
            "json" => Ok(PlanFormat::Json),
            other => Err(format!(
                "Invalid format '{}'. Expected 'text', 'yaml' or 'json'",
                other
            )),
        }
    }
}

impl LaunchArgs {
    /// Merge the config file (if any) with command-line overrides.
    ///
    /// A package given on the command line wins over the file only when it
    /// differs from the default.
    pub fn assembler_config(&self) -> Result<AssemblerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AssemblerConfig::from_file(path)?,
            None => AssemblerConfig::default(),
        };

        if self.config.is_none() || self.package != DEFAULT_PACKAGE {
            config.package = self.package.clone();
        }
        if let Some(description) = &self.description {
            config.set_description_path(description)?;
        }
        if self.with_debug_nodes {
            config.include_debug_nodes = true;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Log filter, falling back to `info` for unknown levels
    pub fn log_filter(&self) -> &'static str {
        match self.log_level.to_lowercase().as_str() {
            "error" => "error",
            "warn" => "warn",
            "debug" => "debug",
            "trace" => "trace",
            _ => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<LaunchArgs, argh::EarlyExit> {
        LaunchArgs::from_args(&["pendulum_launch"], args)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.package, "inverted_pendulum_description");
        assert_eq!(args.format, PlanFormat::Text);
        assert!(!args.dry_run);
        assert_eq!(args.shutdown_timeout(), Duration::from_secs(5));

        let config = args.assembler_config().unwrap();
        assert_eq!(config, AssemblerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "cart_description",
            "--description",
            "robots/cart.urdf",
            "--with-debug-nodes",
            "--dry-run",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert_eq!(args.format, PlanFormat::Yaml);

        let config = args.assembler_config().unwrap();
        assert_eq!(config.package, "cart_description");
        assert_eq!(config.description_dir, "robots");
        assert_eq!(config.description_file, "cart.urdf");
        assert!(config.include_debug_nodes);
    }

    #[test]
    fn test_config_file_package_kept_without_cli_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembler.yaml");
        std::fs::write(&path, "package: other_description\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap()]).unwrap();
        let config = args.assembler_config().unwrap();
        assert_eq!(config.package, "other_description");
    }

    #[test]
    fn test_invalid_format() {
        assert!("xml".parse::<PlanFormat>().is_err());
        assert!(parse(&["--format", "xml"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        let args = parse(&["-l", "DEBUG"]).unwrap();
        assert_eq!(args.log_filter(), "debug");
        let args = parse(&["-l", "verbose"]).unwrap();
        assert_eq!(args.log_filter(), "info");
    }
}

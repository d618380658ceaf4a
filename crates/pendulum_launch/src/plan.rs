//! Launch plan assembly
//!
//! Resolves the pendulum description from the package index and builds the
//! fixed set of node specifications handed to a supervisor. Nothing here
//! spawns processes.

use crate::ament::{AmentIndex, PackageIndex, PackageNotFoundError};
use crate::config::AssemblerConfig;
use crate::description::{DescriptionText, ResourceLocation, ResourceReadError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter carrying the URDF text
pub const ROBOT_DESCRIPTION: &str = "robot_description";

/// Identity transform from `world` to `base_link` (x y z yaw pitch roll parent child)
pub const STATIC_TRANSFORM_ARGS: [&str; 8] =
    ["0.0", "0.0", "0.0", "0.0", "0.0", "0.0", "world", "base_link"];

/// Ordered node parameters
pub type ParameterMap = IndexMap<String, String>;

/// Where a node's stdout and stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Log file only
    Log,
    /// Terminal only
    Screen,
    /// Log file and terminal
    Both,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Log => "log",
            OutputMode::Screen => "screen",
            OutputMode::Both => "both",
        }
    }

    pub fn prints_to_screen(&self) -> bool {
        matches!(self, OutputMode::Screen | OutputMode::Both)
    }

    pub fn writes_to_log(&self) -> bool {
        matches!(self, OutputMode::Log | OutputMode::Both)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a node is started with: parameters or literal arguments, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePayload {
    Parameters(ParameterMap),
    Arguments(Vec<String>),
}

/// Declarative description of one external node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Node name
    pub name: String,
    /// Package installing the executable
    pub package: String,
    /// Executable name within the package
    pub executable: String,
    /// Output routing
    pub output: OutputMode,
    #[serde(flatten)]
    pub payload: NodePayload,
}

impl ProcessSpec {
    /// Parameters, if the node takes any
    pub fn parameters(&self) -> Option<&ParameterMap> {
        match &self.payload {
            NodePayload::Parameters(params) => Some(params),
            NodePayload::Arguments(_) => None,
        }
    }

    /// Literal arguments, if the node takes any
    pub fn arguments(&self) -> Option<&[String]> {
        match &self.payload {
            NodePayload::Arguments(args) => Some(args),
            NodePayload::Parameters(_) => None,
        }
    }
}

/// Ordered list of nodes for a supervisor to start
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub nodes: Vec<ProcessSpec>,
}

impl LaunchPlan {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by name
    pub fn get(&self, name: &str) -> Option<&ProcessSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessSpec> {
        self.nodes.iter()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the plan for a package using the ament index from the environment
pub fn build_launch_plan(package: &str) -> Result<LaunchPlan, AssemblyError> {
    let index = AmentIndex::from_env();
    build_launch_plan_with(&index, &AssemblerConfig::for_package(package))
}

/// Build the plan against an explicit package index and configuration
pub fn build_launch_plan_with(
    index: &dyn PackageIndex,
    config: &AssemblerConfig,
) -> Result<LaunchPlan, AssemblyError> {
    let location = ResourceLocation::resolve(index, &config.package, config.description_path())?;
    log::debug!("Robot description resolved to {}", location);

    let description = DescriptionText::read(&location)?;

    let mut robot_description = ParameterMap::new();
    robot_description.insert(ROBOT_DESCRIPTION.to_string(), description.into_string());

    let rviz = ProcessSpec {
        name: "rviz2".to_string(),
        package: "rviz2".to_string(),
        executable: "rviz2".to_string(),
        output: OutputMode::Log,
        payload: NodePayload::Parameters(robot_description.clone()),
    };

    let joint_state_publisher = ProcessSpec {
        name: "joint_state_publisher".to_string(),
        package: "joint_state_publisher".to_string(),
        executable: "joint_state_publisher".to_string(),
        output: OutputMode::Screen,
        payload: NodePayload::Parameters(robot_description.clone()),
    };

    let static_transform_publisher = ProcessSpec {
        name: "static_transform_publisher".to_string(),
        package: "tf2_ros".to_string(),
        executable: "static_transform_publisher".to_string(),
        output: OutputMode::Log,
        payload: NodePayload::Arguments(
            STATIC_TRANSFORM_ARGS.iter().map(|a| a.to_string()).collect(),
        ),
    };

    let robot_state_publisher = ProcessSpec {
        name: "robot_state_publisher".to_string(),
        package: "robot_state_publisher".to_string(),
        executable: "robot_state_publisher".to_string(),
        output: OutputMode::Both,
        payload: NodePayload::Parameters(robot_description),
    };

    let mut nodes = vec![static_transform_publisher, robot_state_publisher];
    if config.include_debug_nodes {
        nodes.push(joint_state_publisher);
        nodes.push(rviz);
    } else {
        log::debug!(
            "Skipping {} and {} (debug nodes disabled)",
            joint_state_publisher.name,
            rviz.name
        );
    }

    log::info!("Assembled launch plan with {} nodes", nodes.len());
    Ok(LaunchPlan { nodes })
}

/// Errors that can occur while assembling a plan
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    PackageNotFound(#[from] PackageNotFoundError),

    #[error("Failed to load robot description: {0}")]
    ResourceRead(#[from] ResourceReadError),
}

/// Display the launch plan in a human-readable format
impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Launch Plan")?;
        writeln!(f, "===========")?;
        writeln!(f)?;
        writeln!(f, "Nodes (in launch order):")?;

        for (i, node) in self.nodes.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "  {}. {} [{}]", i + 1, node.name, node.output)?;
            writeln!(f, "     Executable: {} / {}", node.package, node.executable)?;

            match &node.payload {
                NodePayload::Arguments(args) => {
                    writeln!(f, "     Arguments: {}", args.join(" "))?;
                }
                NodePayload::Parameters(params) => {
                    writeln!(f, "     Parameters:")?;
                    for (key, value) in params {
                        // URDF text is long, show its size only
                        let lines = value.lines().count();
                        writeln!(f, "       {}: <{} bytes, {} lines>", key, value.len(), lines)?;
                    }
                }
            }
        }

        Ok(())
    }
}

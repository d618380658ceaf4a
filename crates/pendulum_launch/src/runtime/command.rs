//! Turning a process spec into a ROS 2 node command line

use crate::ament::{resolve_executable, ExecutableError, PackageIndex};
use crate::plan::{NodePayload, OutputMode, ParameterMap, ProcessSpec};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Fully resolved command for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommand {
    /// Node name (for logging and output routing)
    pub name: String,
    /// Absolute executable path
    pub program: PathBuf,
    /// Command line arguments
    pub args: Vec<String>,
    /// Output routing
    pub output: OutputMode,
    /// Parameter file written for this node, if any
    pub params_file: Option<PathBuf>,
}

impl NodeCommand {
    /// Resolve the executable and write the parameter file into `params_dir`
    pub fn from_spec(
        spec: &ProcessSpec,
        index: &dyn PackageIndex,
        params_dir: &Path,
    ) -> Result<Self, CommandError> {
        let program = resolve_executable(index, &spec.package, &spec.executable)?;

        let params_file = match &spec.payload {
            NodePayload::Parameters(params) => {
                Some(write_params_file(&spec.name, params, params_dir)?)
            }
            NodePayload::Arguments(_) => None,
        };

        Ok(Self {
            name: spec.name.clone(),
            program,
            args: node_args(spec, params_file.as_deref()),
            output: spec.output,
            params_file,
        })
    }
}

/// Build the argument vector: literal arguments, then the ROS arguments
pub fn node_args(spec: &ProcessSpec, params_file: Option<&Path>) -> Vec<String> {
    let mut args: Vec<String> = spec.arguments().map(<[String]>::to_vec).unwrap_or_default();

    args.push("--ros-args".to_string());
    args.push("-r".to_string());
    args.push(format!("__node:={}", spec.name));

    if let Some(file) = params_file {
        args.push("--params-file".to_string());
        args.push(file.display().to_string());
    }

    args
}

/// Render parameters in the ROS 2 parameter file layout, applied to any node
pub fn params_yaml(params: &ParameterMap) -> Result<String, serde_yaml::Error> {
    let mut node = IndexMap::new();
    node.insert("ros__parameters", params);
    let mut root = IndexMap::new();
    root.insert("/**", node);
    serde_yaml::to_string(&root)
}

fn write_params_file(
    name: &str,
    params: &ParameterMap,
    dir: &Path,
) -> Result<PathBuf, CommandError> {
    let content = params_yaml(params)?;
    let path = dir.join(format!("{}.yaml", name));
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, content))
        .map_err(|e| CommandError::ParamsFile {
            path: path.clone(),
            source: e,
        })?;
    log::debug!("[{}] Wrote parameters to {}", name, path.display());
    Ok(path)
}

/// Errors that can occur while preparing a node command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Executable(#[from] ExecutableError),

    #[error("Failed to serialize parameters: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write parameter file '{}': {source}", .path.display())]
    ParamsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

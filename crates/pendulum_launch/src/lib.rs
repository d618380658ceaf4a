//! Pendulum Launch
//!
//! Assembles the launch plan that displays the inverted pendulum robot: the
//! URDF installed by `inverted_pendulum_description` is read from the ament
//! package index and handed to `robot_state_publisher`, next to a
//! `static_transform_publisher` fixing `world` to `base_link`.
//!
//! # Example
//!
//! ```no_run
//! let plan = pendulum_launch::build_launch_plan("inverted_pendulum_description")?;
//! for node in plan.iter() {
//!     println!("{} ({}/{})", node.name, node.package, node.executable);
//! }
//! # Ok::<(), pendulum_launch::AssemblyError>(())
//! ```
//!
//! The plan is plain data. [`runtime::Supervisor`] is a small supervisor that
//! can run it; any other supervisor can consume the YAML or JSON export.

pub mod ament;
pub mod cli;
pub mod config;
pub mod description;
pub mod plan;
pub mod runtime;

pub use ament::{AmentIndex, MapIndex, PackageIndex, PackageNotFoundError};
pub use cli::{LaunchArgs, PlanFormat};
pub use config::{AssemblerConfig, ConfigError};
pub use description::{DescriptionText, ResourceLocation, ResourceReadError};
pub use plan::{
    build_launch_plan, build_launch_plan_with, AssemblyError, LaunchPlan, NodePayload,
    OutputMode, ParameterMap, ProcessSpec,
};
pub use runtime::{
    ManagedProcess, NodeCommand, OutputRouter, ProcessEvent, ProcessStatus, Supervisor,
    SupervisorConfig, SupervisorError,
};

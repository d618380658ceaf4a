//! Minimal supervisor that runs a launch plan

pub mod command;
pub mod process;
pub mod router;
pub mod supervisor;

pub use command::*;
pub use process::*;
pub use router::*;
pub use supervisor::*;

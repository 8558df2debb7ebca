//! Subprocess backend driving the podman CLI
//!
//! Short-lived commands (`image exists`, `pull`) run to completion and have
//! their output captured; `run --interactive` stays attached and hands its
//! stdin/stdout pipes back to the caller.

pub mod cli;
pub mod process;

pub use cli::PodmanCli;
pub use process::{AttachedProcess, CommandOutput, ContainerProcess};

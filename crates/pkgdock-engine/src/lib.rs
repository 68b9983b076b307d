//! External process plumbing for pkgdock.
//!
//! Everything that leaves the process goes through [`CommandExecutor`]:
//! container engine calls ([`EngineClient`]), the `git` commit query
//! ([`git::short_commit`]), and operator prepare commands
//! ([`Invocation::shell`]).

pub mod client;
pub mod error;
pub mod executor;
pub mod git;

pub use client::{CONTAINER_MOUNT_POINT, EngineClient, EngineError, RunSpec, SHELL_ENTRYPOINT};
pub use error::ExecError;
pub use executor::{CommandExecutor, Invocation, RealExecutor};
pub use git::SourceControlError;

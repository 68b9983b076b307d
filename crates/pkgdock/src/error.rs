use pkgdock_build::{ArtifactError, TemplateError, WorkspaceError};
use pkgdock_engine::{EngineError, ExecError, SourceControlError};

use crate::stage::Stage;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable process exit codes, one per failure class.
///
/// External tool failures are not listed: they exit with the tool's own
/// status.
pub mod exit_code {
    /// I/O failures while writing artifacts or staging the workspace
    pub const FAILURE: i32 = 1;
    /// Config file missing, unreadable, invalid, or section absent
    pub const CONFIG: i32 = 3;
    /// Template missing, unreadable, malformed, or with unresolved placeholders
    pub const TEMPLATE: i32 = 4;
    /// Working directory missing
    pub const WORKDIR: i32 = 5;
    /// `git rev-parse HEAD` failed
    pub const SOURCE_CONTROL: i32 = 6;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] pkgdock_core::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    SourceControl(#[from] SourceControlError),

    #[error("prepare command `{command}` failed")]
    Prepare { command: String, source: ExecError },

    #[error("{stage} stage failed")]
    ExternalTool { stage: Stage, source: EngineError },

    #[error("failed to serialize configuration")]
    Serialize { source: serde_json::Error },
}

impl Error {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(
                pkgdock_core::Error::WorkdirNotFound { .. }
                | pkgdock_core::Error::WorkdirResolve { .. },
            ) => exit_code::WORKDIR,
            Self::Config(_) => exit_code::CONFIG,
            Self::Template(_) => exit_code::TEMPLATE,
            Self::SourceControl(_) => exit_code::SOURCE_CONTROL,
            Self::Prepare { source, .. } => source.exit_code().unwrap_or(exit_code::FAILURE),
            Self::ExternalTool { source, .. } => source.exit_code().unwrap_or(exit_code::FAILURE),
            Self::Artifact(_) | Self::Workspace(_) | Self::Serialize { .. } => exit_code::FAILURE,
        }
    }
}

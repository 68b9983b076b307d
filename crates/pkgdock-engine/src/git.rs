use std::path::Path;

use pkgdock_core::ShortCommit;

use crate::error::ExecError;
use crate::executor::{CommandExecutor, Invocation};

/// Short hash of `HEAD` in the repository containing `repo_dir`.
///
/// # Errors
///
/// - [`SourceControlError::Query`] if `git` cannot run or exits non-zero
/// - [`SourceControlError::Unparseable`] if the output is not a commit hash
pub async fn short_commit<E: CommandExecutor>(
    executor: &E,
    repo_dir: &Path,
) -> Result<ShortCommit, SourceControlError> {
    let invocation = Invocation::new("git", repo_dir).args(["rev-parse", "HEAD"]);
    let output = executor
        .exec(&invocation)
        .await
        .map_err(|e| SourceControlError::Query { source: e })?;

    let commit = ShortCommit::parse(&output).ok_or_else(|| SourceControlError::Unparseable {
        output: output.trim().to_owned(),
    })?;
    tracing::debug!(commit = commit.as_str(), "resolved git commit");
    Ok(commit)
}

#[derive(Debug, thiserror::Error)]
pub enum SourceControlError {
    #[error("unable to get git commit version")]
    Query { source: ExecError },

    #[error("unexpected `git rev-parse HEAD` output: {output:?}")]
    Unparseable { output: String },
}

use std::path::Path;

/// File name of the rendered container build file.
pub const DOCKERFILE: &str = "Dockerfile";

/// File name of the rendered container entrypoint script.
pub const ENTRYPOINT: &str = "entrypoint.sh";

/// Write a rendered artifact, replacing whatever was there.
///
/// Executable artifacts get mode `0755` on Unix.
pub fn write_artifact(path: &Path, content: &str, executable: bool) -> Result<(), ArtifactError> {
    std::fs::write(path, content).map_err(|e| ArtifactError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    if executable {
        make_executable(path)?;
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "artifact written");
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ArtifactError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        ArtifactError::Permissions {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ArtifactError> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to write {path}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to set permissions on {path}")]
    Permissions {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

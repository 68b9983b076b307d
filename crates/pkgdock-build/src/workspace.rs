use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::artifact::{DOCKERFILE, ENTRYPOINT};

/// Directory name of the staged working copy.
pub const WORKSPACE_DIR: &str = "build-env";

/// Source trees a workspace can be staged from, in priority order.
pub const SOURCE_TREES: &[&str] = &["rpmbuild", "debbuild", "volume"];

/// The disposable working copy mounted into build containers.
///
/// Addressed by its well-known path under the context root; any stage may
/// test for it or remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

/// What [`Workspace::stage`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The workspace was copied from this source tree.
    Created { source: PathBuf },
    /// A workspace already existed and was left untouched.
    AlreadyPresent,
    /// No candidate source tree exists; nothing was staged.
    NoSource,
}

impl Workspace {
    /// A workspace living under `root` (normally the working context root).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Copy the first existing candidate into the workspace, once.
    ///
    /// Never refreshes an existing workspace. A missing source tree is not
    /// an error; stages that need the workspace fail when they use it.
    pub fn stage<P: AsRef<Path>>(&self, candidates: &[P]) -> Result<StageOutcome, WorkspaceError> {
        let dest = self.path();
        if dest.exists() {
            tracing::debug!(path = %dest.display(), "workspace already present");
            return Ok(StageOutcome::AlreadyPresent);
        }

        let Some(source) = candidates
            .iter()
            .map(|c| self.root.join(c))
            .find(|c| c.is_dir())
        else {
            tracing::debug!(
                root = %self.root.display(),
                "no source tree found; workspace not staged"
            );
            return Ok(StageOutcome::NoSource);
        };

        tracing::info!(
            from = %source.display(),
            to = %dest.display(),
            "staging workspace"
        );
        copy_tree(&source, &dest)?;
        Ok(StageOutcome::Created { source })
    }

    /// Stage from the default [`SOURCE_TREES`].
    pub fn stage_default(&self) -> Result<StageOutcome, WorkspaceError> {
        self.stage(SOURCE_TREES)
    }

    /// Remove rendered artifacts, the workspace, and `extra` paths.
    ///
    /// Absent paths are skipped, so repeated calls are harmless. Returns the
    /// paths that were actually removed.
    pub fn clear<P: AsRef<Path>>(&self, extra: &[P]) -> Result<Vec<PathBuf>, WorkspaceError> {
        let targets = [DOCKERFILE, ENTRYPOINT, WORKSPACE_DIR]
            .iter()
            .map(|p| self.root.join(p))
            .chain(extra.iter().map(|p| self.root.join(p)));

        let mut removed = Vec::new();
        for path in targets {
            let meta = match std::fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(WorkspaceError::Inspect { path, source: e }),
            };

            let result = if meta.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|e| WorkspaceError::Remove {
                path: path.clone(),
                source: e,
            })?;

            tracing::info!(path = %path.display(), "removed");
            removed.push(path);
        }
        Ok(removed)
    }
}

fn copy_tree(source: &Path, dest: &Path) -> Result<(), WorkspaceError> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| WorkspaceError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| WorkspaceError::OutsideSource {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| WorkspaceError::CreateDir {
                path: target.clone(),
                source: e,
            })?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| WorkspaceError::CopyFile {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), WorkspaceError> {
    let points_to = std::fs::read_link(link).map_err(|e| WorkspaceError::CopyFile {
        path: link.to_path_buf(),
        source: e,
    })?;
    std::os::unix::fs::symlink(&points_to, target).map_err(|e| WorkspaceError::CopyFile {
        path: link.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), WorkspaceError> {
    std::fs::copy(link, target)
        .map(|_| ())
        .map_err(|e| WorkspaceError::CopyFile {
            path: link.to_path_buf(),
            source: e,
        })
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to walk source tree {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("path {path} escaped its source tree")]
    OutsideSource {
        path: PathBuf,
        source: std::path::StripPrefixError,
    },
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to inspect {path}")]
    Inspect {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

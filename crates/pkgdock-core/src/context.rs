use std::path::{Path, PathBuf};

/// The directory every stage of one invocation works in.
///
/// Relative template, artifact and workspace paths resolve against
/// [`root`](Self::root), and child processes are spawned with it as their
/// current directory. The process-wide working directory is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    root: PathBuf,
}

impl WorkingContext {
    /// Wrap an already-resolved directory without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Enter `workdir` (relative to `base`), or `base` itself when unset.
    ///
    /// The resulting root is canonical, so it can be handed to a container
    /// engine as a bind-mount source.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkdirNotFound`](crate::Error::WorkdirNotFound) if the directory is missing
    /// - [`Error::WorkdirResolve`](crate::Error::WorkdirResolve) if it cannot be canonicalized
    pub fn enter(base: &Path, workdir: Option<&Path>) -> crate::Result<Self> {
        let target = match workdir {
            Some(dir) => {
                let target = base.join(dir);
                if !target.exists() {
                    return Err(crate::Error::WorkdirNotFound { path: target });
                }
                tracing::info!(path = %target.display(), "changing working directory");
                target
            }
            None => base.to_path_buf(),
        };

        let root = target
            .canonicalize()
            .map_err(|e| crate::Error::WorkdirResolve {
                path: target.clone(),
                source: e,
            })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the context root. Absolute paths pass through.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joins_relative_and_keeps_absolute() {
        let ctx = WorkingContext::new("/work");
        assert_eq!(ctx.path("Dockerfile"), PathBuf::from("/work/Dockerfile"));
        assert_eq!(ctx.path("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}

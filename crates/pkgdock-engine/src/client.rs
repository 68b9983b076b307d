use std::path::{Path, PathBuf};

use crate::error::ExecError;
use crate::executor::{CommandExecutor, Invocation, RealExecutor};

/// In-container path the workspace is bind-mounted to.
pub const CONTAINER_MOUNT_POINT: &str = "/home/builder/build";

/// Entrypoint override for interactive shells.
pub const SHELL_ENTRYPOINT: &str = "/bin/bash";

/// Container engine operations, parameterized over the executor for testability.
///
/// Speaks the docker CLI dialect; `podman` works as a drop-in program.
pub struct EngineClient<E: CommandExecutor = RealExecutor> {
    program: String,
    executor: E,
}

impl EngineClient<RealExecutor> {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            executor: RealExecutor,
        }
    }
}

impl<E: CommandExecutor> EngineClient<E> {
    pub fn with_executor(program: impl Into<String>, executor: E) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    /// The underlying executor, for non-engine commands in the same run.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    // ── Image ──

    /// `<engine> build -t <image> .` with `context_dir` as build context.
    pub async fn build_image(&self, context_dir: &Path, image: &str) -> Result<(), EngineError> {
        let invocation = Invocation::new(&self.program, context_dir).args(["build", "-t", image, "."]);
        tracing::info!(command = %invocation, "building image");

        self.executor
            .exec_streaming(&invocation)
            .await
            .map_err(|e| EngineError::Build {
                image: image.to_owned(),
                source: e,
            })
    }

    /// `<engine> tag <source> <target>`.
    pub async fn tag_image(&self, cwd: &Path, source: &str, target: &str) -> Result<(), EngineError> {
        let invocation = Invocation::new(&self.program, cwd).args(["tag", source, target]);
        tracing::info!(command = %invocation, "tagging image");

        self.executor
            .exec_streaming(&invocation)
            .await
            .map_err(|e| EngineError::Tag {
                target: target.to_owned(),
                source: e,
            })
    }

    // ── Container ──

    /// Run a build container and wait for it to exit.
    pub async fn run_container(&self, cwd: &Path, spec: &RunSpec) -> Result<(), EngineError> {
        let invocation = self.run_invocation(cwd, spec);
        tracing::info!(command = %invocation, "running container");

        self.executor
            .exec_streaming(&invocation)
            .await
            .map_err(|e| EngineError::Run {
                image: spec.image.clone(),
                source: e,
            })
    }

    /// The `run` command line for `spec`, without executing it.
    pub fn run_invocation(&self, cwd: &Path, spec: &RunSpec) -> Invocation {
        let mut invocation = Invocation::new(&self.program, cwd).args(["run", "--rm"]);
        if spec.interactive {
            invocation = invocation.arg("-i");
        }
        invocation = invocation.arg("-v").arg(format!(
            "{}:{}",
            spec.workspace.display(),
            spec.mount_point
        ));
        if let Some(entrypoint) = &spec.entrypoint {
            invocation = invocation.arg(format!("--entrypoint={entrypoint}"));
        }
        for (key, value) in &spec.env {
            invocation = invocation.arg("-e").arg(format!("{key}={value}"));
        }
        invocation.args(["-t", spec.image.as_str()])
    }
}

/// How to run one build container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    /// Host directory mounted at [`mount_point`](Self::mount_point)
    pub workspace: PathBuf,
    pub mount_point: String,
    /// Environment injected with `-e`, in order
    pub env: Vec<(String, String)>,
    /// Keep stdin open (`-i`)
    pub interactive: bool,
    /// Override the image entrypoint
    pub entrypoint: Option<String>,
}

impl RunSpec {
    /// A batch build run of `image` with `workspace` mounted at the default point.
    pub fn new(image: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            workspace: workspace.into(),
            mount_point: CONTAINER_MOUNT_POINT.to_owned(),
            env: Vec::new(),
            interactive: false,
            entrypoint: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Turn the run into an interactive shell session.
    pub fn interactive_shell(mut self) -> Self {
        self.interactive = true;
        self.entrypoint = Some(SHELL_ENTRYPOINT.to_owned());
        self
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("image build for '{image}' failed")]
    Build { image: String, source: ExecError },

    #[error("tagging image as '{target}' failed")]
    Tag { target: String, source: ExecError },

    #[error("container run of '{image}' failed")]
    Run { image: String, source: ExecError },
}

impl EngineError {
    /// Exit status of the engine process, when it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Build { source, .. } | Self::Tag { source, .. } | Self::Run { source, .. } => {
                source.exit_code()
            }
        }
    }
}

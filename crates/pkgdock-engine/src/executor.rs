use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::ExecError;

/// One external command: program, arguments, and the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// `sh -c <command>`, for operator-supplied command lines.
    pub fn shell(command: &str, cwd: &Path) -> Self {
        Self::new("sh", cwd).arg("-c").arg(command)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Abstraction over external process execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// Every call blocks the caller until the child exits; nothing runs in
/// parallel.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, invocation: &Invocation) -> Result<String, ExecError>;

    /// Execute a command with stdio inherited from this process.
    async fn exec_streaming(&self, invocation: &Invocation) -> Result<(), ExecError>;
}

/// Real process executor backed by `tokio::process`.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, invocation: &Invocation) -> Result<String, ExecError> {
        tracing::debug!(command = %invocation, cwd = %invocation.cwd.display(), "exec");

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: invocation.program.clone(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ExecError::InvalidUtf8 {
                program: invocation.program.clone(),
                source: e,
            })
        } else {
            Err(ExecError::Failed {
                command: invocation.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }

    async fn exec_streaming(&self, invocation: &Invocation) -> Result<(), ExecError> {
        tracing::debug!(command = %invocation, cwd = %invocation.cwd.display(), "exec streaming");

        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ExecError::Spawn {
                program: invocation.program.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: invocation.to_string(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}

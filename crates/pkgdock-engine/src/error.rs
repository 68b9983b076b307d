#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to run `{program}`; is it installed and on PATH?")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{command}` {}{}", describe_exit(*code), describe_stderr(stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{program}` output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },
}

impl ExecError {
    /// Exit status of the child, when it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Spawn { .. } | Self::InvalidUtf8 { .. } => None,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Configuration ──
    #[error("config file {path} does not exist")]
    ConfigNotFound { path: PathBuf },

    #[error("failed to read config from {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(
        "section '{section}' not found in {path}; available sections: {}",
        format_sections(available)
    )]
    SectionNotFound {
        path: PathBuf,
        section: String,
        available: Vec<String>,
    },

    // ── Working directory ──
    #[error("working directory {path} does not exist")]
    WorkdirNotFound { path: PathBuf },

    #[error("failed to resolve working directory {path}")]
    WorkdirResolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn format_sections(sections: &[String]) -> String {
    if sections.is_empty() {
        "(none)".to_owned()
    } else {
        sections.join(", ")
    }
}

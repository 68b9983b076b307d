use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A configuration section resolved against the defaults.
///
/// Every recognized option carries its effective value once construction
/// succeeds, so no stage ever has to deal with a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Name of the active section
    pub section: String,
    /// Container image name used for build, tag and run
    pub image: String,
    /// Build-file (Dockerfile) template path
    pub dockerfile: PathBuf,
    /// Entrypoint script template path
    pub entrypoint: PathBuf,
    /// Package spec file or free-form build target
    pub target: Option<String>,
    /// Shell command run once before the containerized build
    pub prepare: Option<String>,
    /// Directory every stage except `show` works in
    pub workdir: Option<PathBuf>,
    /// Append the short git commit to the release tag
    pub git: bool,
    /// Container engine program (docker, podman)
    pub engine: String,
}

/// Raw section as written in the file. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawSection {
    #[serde(alias = "imagename")]
    image: Option<String>,
    dockerfile: Option<PathBuf>,
    entrypoint: Option<PathBuf>,
    #[serde(alias = "spec")]
    target: Option<String>,
    #[serde(alias = "prepare_cmd")]
    prepare: Option<String>,
    workdir: Option<PathBuf>,
    git: Option<toml::Value>,
    engine: Option<String>,
}

impl ResolvedConfig {
    /// A section with every option at its default, as listed in [`DEFAULTS`].
    pub fn defaults(section: &str) -> Self {
        Self {
            section: section.to_owned(),
            image: DEFAULT_IMAGE.to_owned(),
            dockerfile: PathBuf::from(DEFAULT_DOCKERFILE),
            entrypoint: PathBuf::from(DEFAULT_ENTRYPOINT),
            target: None,
            prepare: None,
            workdir: None,
            git: DEFAULT_GIT,
            engine: DEFAULT_ENGINE.to_owned(),
        }
    }

    /// Load `source_path` and resolve `section` from it.
    ///
    /// Slashes are stripped from the section name, so a shell-completed
    /// directory name like `rpm/` selects `[rpm]`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`](crate::Error::ConfigNotFound) if the file does not exist
    /// - [`Error::ConfigRead`](crate::Error::ConfigRead) / [`Error::ConfigParse`](crate::Error::ConfigParse)
    ///   if it cannot be read or is not valid TOML
    /// - [`Error::SectionNotFound`](crate::Error::SectionNotFound) if the section is absent
    pub fn resolve(source_path: &Path, section: &str) -> crate::Result<Self> {
        if !source_path.exists() {
            return Err(crate::Error::ConfigNotFound {
                path: source_path.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(source_path).map_err(|e| crate::Error::ConfigRead {
                path: source_path.to_path_buf(),
                source: e,
            })?;

        Self::from_toml_str(&content, section).map_err(|e| match e {
            ParseFailure::Toml(source) => crate::Error::ConfigParse {
                path: source_path.to_path_buf(),
                source,
            },
            ParseFailure::MissingSection { section, available } => {
                crate::Error::SectionNotFound {
                    path: source_path.to_path_buf(),
                    section,
                    available,
                }
            }
        })
    }

    fn from_toml_str(content: &str, section: &str) -> Result<Self, ParseFailure> {
        let table: toml::Table = toml::from_str(content).map_err(ParseFailure::Toml)?;

        let available = section_names(&table);
        tracing::info!(sections = %available.join(", "), "available sections");

        let section = section.replace('/', "");
        let raw: RawSection = match table.get(&section) {
            Some(value @ toml::Value::Table(_)) => {
                value.clone().try_into().map_err(ParseFailure::Toml)?
            }
            _ => return Err(ParseFailure::MissingSection { section, available }),
        };

        let mut config = Self::defaults(&section);
        if let Some(image) = raw.image {
            config.image = image;
        }
        if let Some(dockerfile) = raw.dockerfile {
            config.dockerfile = dockerfile;
        }
        if let Some(entrypoint) = raw.entrypoint {
            config.entrypoint = entrypoint;
        }
        if let Some(engine) = raw.engine {
            config.engine = engine;
        }
        config.target = non_empty(raw.target);
        config.prepare = non_empty(raw.prepare);
        config.workdir = raw.workdir.filter(|p| !p.as_os_str().is_empty());
        if let Some(value) = raw.git.as_ref() {
            match parse_bool(value) {
                Some(git) => config.git = git,
                None => tracing::warn!(
                    section = %section,
                    value = %value,
                    "option `git` is not a boolean; using default"
                ),
            }
        }

        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// Every recognized option with its effective value, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("section", self.section.clone()),
            ("image", self.image.clone()),
            ("dockerfile", self.dockerfile.display().to_string()),
            ("entrypoint", self.entrypoint.display().to_string()),
            ("target", display_opt(self.target.as_deref())),
            ("prepare", display_opt(self.prepare.as_deref())),
            (
                "workdir",
                display_opt(self.workdir.as_ref().map(|p| p.display().to_string()).as_deref()),
            ),
            ("git", self.git.to_string()),
            ("engine", self.engine.clone()),
        ]
    }
}

enum ParseFailure {
    Toml(toml::de::Error),
    MissingSection {
        section: String,
        available: Vec<String>,
    },
}

fn section_names(table: &toml::Table) -> Vec<String> {
    table
        .iter()
        .filter(|(_, v)| v.is_table())
        .map(|(k, _)| k.clone())
        .collect()
}

/// Boolean option parsing, lenient with the usual INI spellings.
fn parse_bool(value: &toml::Value) -> Option<bool> {
    match value {
        toml::Value::Boolean(b) => Some(*b),
        toml::Value::Integer(1) => Some(true),
        toml::Value::Integer(0) => Some(false),
        toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Some(true),
            "0" | "no" | "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn display_opt(value: Option<&str>) -> String {
    value.unwrap_or("(none)").to_owned()
}

const DEFAULT_IMAGE: &str = "builder";
const DEFAULT_DOCKERFILE: &str = "Dockerfile.template";
const DEFAULT_ENTRYPOINT: &str = "entrypoint.sh.template";
const DEFAULT_GIT: bool = false;
const DEFAULT_ENGINE: &str = "docker";

/// Option name to default value, for every option that has one.
///
/// `target`, `prepare` and `workdir` have no default and stay unset.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("image", DEFAULT_IMAGE),
    ("dockerfile", DEFAULT_DOCKERFILE),
    ("entrypoint", DEFAULT_ENTRYPOINT),
    ("git", "false"),
    ("engine", DEFAULT_ENGINE),
];

use std::fmt;

/// Environment variable carrying the CI build counter.
pub const BUILD_NUMBER_VAR: &str = "BUILD_NUMBER";

/// Build number used when [`BUILD_NUMBER_VAR`] is unset or empty.
pub const DEFAULT_BUILD_NUMBER: &str = "0";

/// Number of commit hash characters embedded in a release tag.
pub const SHORT_COMMIT_LEN: usize = 7;

/// Monotonic build counter, as handed over by CI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNumber(String);

impl BuildNumber {
    pub fn new(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self(v.trim().to_owned()),
            _ => Self(DEFAULT_BUILD_NUMBER.to_owned()),
        }
    }

    /// Read [`BUILD_NUMBER_VAR`] from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os(BUILD_NUMBER_VAR).map(|v| v.to_string_lossy().into_owned()),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when no real build number was provided.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_BUILD_NUMBER
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abbreviated commit hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortCommit(String);

impl ShortCommit {
    /// Extract the short form from `git rev-parse HEAD` output.
    ///
    /// Returns `None` unless the output starts with at least
    /// [`SHORT_COMMIT_LEN`] hex digits.
    pub fn parse(rev_parse_output: &str) -> Option<Self> {
        let hash = rev_parse_output.trim();
        let prefix = hash.get(..SHORT_COMMIT_LEN)?;
        if prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(prefix.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Release identifier: `<build>` or `<build>.git<commit>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    pub fn new(build: &BuildNumber, commit: Option<&ShortCommit>) -> Self {
        match commit {
            Some(commit) => Self(format!("{build}.git{commit}", commit = commit.as_str())),
            None => Self(build.as_str().to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pkgdock_core::{BuildEnv, ReleaseTag, ResolvedConfig};

/// Named values available to `{placeholder}` substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// The variable set every generated artifact is rendered with.
    ///
    /// | name | value |
    /// |---|---|
    /// | `userid`, `groupid` | numeric uid/gid of the invoking user |
    /// | `release` | release tag |
    /// | `target`, `spec` | build target (empty when unset) |
    /// | `image` | image name |
    /// | `build_number` | raw build number |
    pub fn standard(config: &ResolvedConfig, env: &BuildEnv, release: &ReleaseTag) -> Self {
        let target = config.target.clone().unwrap_or_default();
        Self::new()
            .with("userid", env.identity.uid.to_string())
            .with("groupid", env.identity.gid.to_string())
            .with("release", release.as_str())
            .with("target", target.clone())
            .with("spec", target)
            .with("image", config.image.clone())
            .with("build_number", env.build_number.as_str())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// A flat placeholder template.
///
/// `{name}` is replaced by the variable `name`; `{{` and `}}` produce
/// literal braces. Names match `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

impl Template {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read a template from disk.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::NotFound`] if `path` does not exist
    /// - [`TemplateError::Read`] if it cannot be read as UTF-8 text
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        if !path.exists() {
            return Err(TemplateError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path).map_err(|e| TemplateError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "template loaded");
        Ok(Self::new(path.display().to_string(), source))
    }

    /// Distinct placeholder names, sorted.
    pub fn placeholders(&self) -> Result<Vec<&str>, TemplateError> {
        let mut names: Vec<&str> = self
            .tokens()?
            .into_iter()
            .filter_map(|t| match t {
                Token::Placeholder(name) => Some(name),
                Token::Text(_) => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        Ok(names)
    }

    /// Fail the way [`render`](Self::render) would, without producing output.
    ///
    /// Only the variable names in `vars` matter, not their values.
    pub fn check(&self, vars: &Variables) -> Result<(), TemplateError> {
        for name in self.placeholders()? {
            if vars.get(name).is_none() {
                return Err(TemplateError::UnresolvedPlaceholder {
                    template: self.name.clone(),
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Substitute every placeholder. Pure; never touches the filesystem.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::Malformed`] on unbalanced braces or an invalid name
    /// - [`TemplateError::UnresolvedPlaceholder`] if a name has no variable
    pub fn render(&self, vars: &Variables) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for token in self.tokens()? {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Placeholder(name) => {
                    let value =
                        vars.get(name)
                            .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                                template: self.name.clone(),
                                name: name.to_owned(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn tokens(&self) -> Result<Vec<Token<'_>>, TemplateError> {
        let src = self.source.as_str();
        let bytes = src.as_bytes();
        let mut tokens = Vec::new();
        let mut text_start = 0;
        let mut i = 0;

        // Braces are ASCII, so every index we slice at is a char boundary.
        while i < bytes.len() {
            match bytes[i] {
                b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                    tokens.push(Token::Text(&src[text_start..=i]));
                    i += 2;
                    text_start = i;
                }
                b'{' => {
                    if text_start < i {
                        tokens.push(Token::Text(&src[text_start..i]));
                    }
                    let close = src[i + 1..]
                        .find('}')
                        .ok_or_else(|| self.malformed(i, "unterminated placeholder"))?;
                    let name = &src[i + 1..i + 1 + close];
                    if !is_valid_name(name) {
                        return Err(self.malformed(i, "invalid placeholder name"));
                    }
                    tokens.push(Token::Placeholder(name));
                    i += close + 2;
                    text_start = i;
                }
                b'}' => return Err(self.malformed(i, "unmatched '}'")),
                _ => i += 1,
            }
        }
        if text_start < bytes.len() {
            tokens.push(Token::Text(&src[text_start..]));
        }
        Ok(tokens)
    }

    fn malformed(&self, offset: usize, reason: &'static str) -> TemplateError {
        TemplateError::Malformed {
            template: self.name.clone(),
            offset,
            reason,
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {path} does not exist")]
    NotFound { path: PathBuf },

    #[error("failed to read template {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed template {template} at byte {offset}: {reason}")]
    Malformed {
        template: String,
        offset: usize,
        reason: &'static str,
    },

    #[error("unresolved placeholder {{{name}}} in template {template}")]
    UnresolvedPlaceholder { template: String, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        Variables::new()
            .with("userid", "1000")
            .with("groupid", "100")
            .with("release", "7.gitabcdef0")
    }

    #[test]
    fn substitutes_placeholders() {
        let t = Template::new("t", "RUN useradd -u {userid} -g {groupid} builder\n");
        assert_eq!(
            t.render(&vars()).unwrap(),
            "RUN useradd -u 1000 -g 100 builder\n"
        );
    }

    #[test]
    fn escaped_braces_are_literal() {
        let t = Template::new("t", "echo ${{HOME}} {release} {{}}");
        assert_eq!(t.render(&vars()).unwrap(), "echo ${HOME} 7.gitabcdef0 {}");
    }

    #[test]
    fn unresolved_placeholder_is_error() {
        let t = Template::new("Dockerfile.template", "FROM {base}\n");
        let err = t.render(&vars()).unwrap_err();
        assert!(
            matches!(err, TemplateError::UnresolvedPlaceholder { ref name, .. } if name == "base"),
            "got: {err:?}"
        );
        assert!(err.to_string().contains("{base}"), "got: {err}");
    }

    #[test]
    fn unterminated_placeholder_is_malformed() {
        let t = Template::new("t", "abc {userid");
        assert!(matches!(
            t.render(&vars()),
            Err(TemplateError::Malformed { offset: 4, .. })
        ));
    }

    #[test]
    fn stray_closing_brace_is_malformed() {
        let t = Template::new("t", "a } b");
        assert!(matches!(
            t.render(&vars()),
            Err(TemplateError::Malformed { offset: 2, .. })
        ));
    }

    #[test]
    fn invalid_names_are_malformed() {
        for src in ["{}", "{ userid }", "{1abc}", "{a-b}"] {
            let t = Template::new("t", src);
            assert!(
                matches!(t.render(&vars()), Err(TemplateError::Malformed { .. })),
                "{src} should be malformed"
            );
        }
    }

    #[test]
    fn placeholders_are_sorted_and_distinct() {
        let t = Template::new("t", "{release} {userid} {release} {{literal}}");
        assert_eq!(t.placeholders().unwrap(), vec!["release", "userid"]);
    }

    #[test]
    fn check_agrees_with_render() {
        let ok = Template::new("t", "{userid} {{x}}");
        assert!(ok.check(&vars()).is_ok());

        let unresolved = Template::new("t", "{userid} {base}");
        assert!(matches!(
            unresolved.check(&vars()),
            Err(TemplateError::UnresolvedPlaceholder { ref name, .. }) if name == "base"
        ));

        let malformed = Template::new("t", "{userid");
        assert!(matches!(
            malformed.check(&vars()),
            Err(TemplateError::Malformed { .. })
        ));
    }

    #[test]
    fn non_ascii_text_survives() {
        let t = Template::new("t", "# ビルド {userid} ✓");
        assert_eq!(t.render(&vars()).unwrap(), "# ビルド 1000 ✓");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn brace_free_text_renders_unchanged(text in "[^{}]{0,200}") {
                let t = Template::new("t", text.clone());
                prop_assert_eq!(t.render(&Variables::new()).unwrap(), text);
            }

            #[test]
            fn rendering_is_deterministic(
                parts in proptest::collection::vec(("[^{}]{0,20}", prop_oneof!["userid", "groupid", "release"]), 0..10),
            ) {
                let source: String = parts
                    .iter()
                    .map(|(text, name)| format!("{text}{{{name}}}"))
                    .collect();
                let t = Template::new("t", source);
                let first = t.render(&vars()).unwrap();
                let second = t.render(&vars()).unwrap();
                prop_assert_eq!(first, second);
            }

            #[test]
            fn arbitrary_input_fails_cleanly(source in ".{0,100}") {
                let t = Template::new("t", source);
                if let Err(e) = t.render(&vars()) {
                    let is_expected_error = matches!(
                        e,
                        TemplateError::Malformed { .. } | TemplateError::UnresolvedPlaceholder { .. }
                    );
                    prop_assert!(is_expected_error);
                }
            }
        }
    }
}

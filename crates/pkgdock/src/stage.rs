use std::fmt;

/// One independently invocable pipeline operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Render artifacts, build the image, tag it with the build number
    Image,
    /// Stage the workspace and build the package in a container
    Package {
        /// Clear artifacts and workspace first
        remove: bool,
    },
    /// Interactive shell in a build container
    Shell,
    /// Render and write artifacts
    Generate,
    /// Remove artifacts and workspace
    Clear,
    /// Print the resolved configuration
    Show {
        /// JSON instead of the aligned text listing
        json: bool,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Package { .. } => "package",
            Self::Shell => "shell",
            Self::Generate => "generate",
            Self::Clear => "clear",
            Self::Show { .. } => "show",
        }
    }

    /// Whether the stage works inside the configured `workdir`.
    ///
    /// Introspection must keep working with a broken `workdir` setting.
    pub fn enters_workdir(&self) -> bool {
        !matches!(self, Self::Show { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

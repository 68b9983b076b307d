//! Build container images and packages inside them.
//!
//! `pkgdock` resolves a named build configuration, renders the container
//! build file and entrypoint from templates, stages an isolated workspace,
//! and drives an external container engine through one [`Stage`] at a time.
//!
//! # Stages
//!
//! | Stage | Does |
//! |-------|------|
//! | `generate` | render `Dockerfile` (+ `entrypoint.sh`) |
//! | `image` | `generate`, `<engine> build`, tag with `BUILD_NUMBER` |
//! | `package` | clear?, stage `build-env/`, prepare, `<engine> run` |
//! | `shell` | stage, `<engine> run -i --entrypoint=/bin/bash` |
//! | `clear` | remove artifacts and `build-env/` |
//! | `show` | print the resolved configuration |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pkgdock::{BuildEnv, Pipeline, ResolvedConfig, Stage, context_for};
//!
//! # async fn run() -> pkgdock::Result<()> {
//! let config = ResolvedConfig::resolve(Path::new("pkgdock.toml"), "default")?;
//! let stage = Stage::Package { remove: false };
//! let ctx = context_for(stage, Path::new("."), &config)?;
//! let env = BuildEnv::capture();
//! if let Some(output) = Pipeline::new(&config, &ctx, &env).run(stage).await? {
//!     print!("{output}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Exit codes for each failure class are listed in [`exit_code`].

pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::{Error, Result, exit_code};
pub use pipeline::{Pipeline, RELEASE_ENV, TARGET_ENV, context_for, show_report};
pub use stage::Stage;

// Core types flattened into root namespace for convenience.
pub use pkgdock_core::{
    BuildEnv, BuildNumber, ReleaseTag, ResolvedConfig, UserIdentity, WorkingContext,
};

/// Template rendering and workspace staging.
///
/// See [`pkgdock-build`](https://crates.io/crates/pkgdock-build) for details.
pub mod build {
    pub use pkgdock_build::*;
}

/// Container engine and git process plumbing.
///
/// See [`pkgdock-engine`](https://crates.io/crates/pkgdock-engine) for details.
pub mod engine {
    pub use pkgdock_engine::*;
}

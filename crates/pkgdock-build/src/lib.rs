//! Artifact rendering and workspace staging for pkgdock.
//!
//! # Build pipeline
//!
//! ```text
//! pkgdock package
//!   1. Clear      ── Workspace::clear()      (only with --remove)
//!   2. Stage      ── rpmbuild/ | debbuild/ | volume/ → build-env/
//!   3. Prepare    ── sh -c "<prepare>"
//!   4. Release    ── <BUILD_NUMBER>[.git<short commit>]
//!   5. Container  ── <engine> run -v build-env:/home/builder/build <image>
//! ```
//!
//! # Templates
//!
//! `Dockerfile` and `entrypoint.sh` are rendered from flat templates:
//! `{name}` placeholders, `{{`/`}}` for literal braces. See
//! [`Variables::standard`] for the variables every artifact receives.

pub mod artifact;
pub mod template;
pub mod workspace;

pub use artifact::{ArtifactError, DOCKERFILE, ENTRYPOINT, write_artifact};
pub use template::{Template, TemplateError, Variables};
pub use workspace::{SOURCE_TREES, StageOutcome, WORKSPACE_DIR, Workspace, WorkspaceError};

//! Core types and configuration for pkgdock.
//!
//! This crate defines the resolved build configuration
//! ([`ResolvedConfig`]), release tag computation ([`ReleaseTag`]), the
//! explicit working directory ([`WorkingContext`]), and shared error types.

pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod release;

pub use config::{DEFAULTS, ResolvedConfig};
pub use context::WorkingContext;
pub use error::{Error, Result};
pub use identity::{BuildEnv, UserIdentity};
pub use release::{BuildNumber, ReleaseTag, ShortCommit};

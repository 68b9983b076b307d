use crate::release::BuildNumber;

/// Numeric identity of the invoking user, baked into generated images so
/// files written into the workspace keep the caller's ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl UserIdentity {
    #[cfg(unix)]
    pub fn current() -> Self {
        Self {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }

    #[cfg(not(unix))]
    pub fn current() -> Self {
        Self { uid: 0, gid: 0 }
    }
}

/// Inputs read from the process environment once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    pub build_number: BuildNumber,
    pub identity: UserIdentity,
}

impl BuildEnv {
    /// Capture `BUILD_NUMBER` and the current uid/gid.
    pub fn capture() -> Self {
        Self {
            build_number: BuildNumber::from_env(),
            identity: UserIdentity::current(),
        }
    }
}

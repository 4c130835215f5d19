use std::fmt;
use std::path::PathBuf;

/// A `toolchain.<arch>.cmake` file found in the toolchain directory.
///
/// Descriptors are rebuilt on every scan. The file may disappear between a
/// scan and its use; callers re-check with
/// [`ToolchainRegistry::is_available`](super::ToolchainRegistry::is_available).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolchainDescriptor {
    /// Architecture name, e.g. `arm` for `toolchain.arm.cmake`
    pub architecture: String,

    /// Absolute path to the toolchain file
    pub path: PathBuf,
}

impl fmt::Display for ToolchainDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.architecture, self.path.display())
    }
}

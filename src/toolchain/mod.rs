//! Toolchain discovery
//!
//! Architectures are derived from the file names in one toolchain directory:
//! every `toolchain.<arch>.cmake` (any case) makes `<arch>` available. The
//! directory is re-read on every query, nothing is cached.

pub mod types;

pub use types::ToolchainDescriptor;

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TOOLCHAIN_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^toolchain\.(.+)\.cmake$").expect("toolchain pattern is valid")
});

#[derive(Debug, Clone, Default)]
pub struct ToolchainRegistry {
    dir: PathBuf,
}

impl ToolchainRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Architectures with a toolchain file, sorted ascending.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn list_architectures(&self) -> Vec<String> {
        self.descriptors()
            .into_iter()
            .map(|descriptor| descriptor.architecture)
            .collect()
    }

    /// Every toolchain file found, sorted by architecture. Paths are the
    /// files as found on disk, whatever the case of their name.
    pub fn descriptors(&self) -> Vec<ToolchainDescriptor> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("toolchain dir {} not readable: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut descriptors: Vec<ToolchainDescriptor> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let architecture = TOOLCHAIN_FILE
                    .captures(&name.to_string_lossy())
                    .map(|caps| caps[1].to_string())?;
                let path = entry.path();
                Some(ToolchainDescriptor {
                    architecture,
                    path: std::path::absolute(&path).unwrap_or(path),
                })
            })
            .collect();
        descriptors.sort();
        descriptors
    }

    /// Whether any toolchain is configured at all.
    pub fn has_toolchains(&self) -> bool {
        !self.descriptors().is_empty()
    }

    /// Absolute path of the toolchain file for `architecture`.
    ///
    /// A discovered file is returned as found; otherwise this is the
    /// lowercase `toolchain.<arch>.cmake` name, which may not exist.
    pub fn toolchain_path_for(&self, architecture: &str) -> PathBuf {
        if let Some(found) = self
            .descriptors()
            .into_iter()
            .find(|descriptor| descriptor.architecture == architecture)
        {
            return found.path;
        }
        let path = self.dir.join(format!("toolchain.{architecture}.cmake"));
        std::path::absolute(&path).unwrap_or(path)
    }

    pub fn is_available(&self, architecture: &str) -> bool {
        self.toolchain_path_for(architecture).exists()
    }
}

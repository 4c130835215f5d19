//! Settings (`cmide.toml`).
//!
//! Looked up in the project root first, then in `~/.cmide/config.toml`.
//! Relative directories resolve against the folder of the file they were
//! read from.

use crate::toolchain::ToolchainRegistry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cmide.toml";

pub const DEFAULT_GENERATOR: &str = "Eclipse CDT4 - Unix Makefiles";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Settings {
    pub cmake: CmakeConfig,
    pub toolchains: ToolchainConfig,
    pub build: BuildConfig,

    /// File the settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CmakeConfig {
    /// Explicit cmake executable; the bare `cmake` is used otherwise
    pub path: Option<String>,
    /// Extra arguments appended verbatim to a full setup
    pub args: Option<String>,
    pub make_args: Option<String>,
    pub module_path: Option<PathBuf>,
    pub generator: String,
    pub ide_version: String,
}

impl Default for CmakeConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: None,
            make_args: None,
            module_path: None,
            generator: DEFAULT_GENERATOR.to_string(),
            ide_version: "4.7".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ToolchainConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BuildConfig {
    pub types: Vec<String>,
    /// Root of the per-architecture build directories, relative to the project
    pub bin_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            types: ["Debug", "Release", "RelWithDebInfo", "MinSizeRel"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bin_dir: "bin".to_string(),
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings - check the TOML syntax")
    }

    /// Read one settings file, resolving relative paths against its folder.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings =
            Self::parse(&content).with_context(|| format!("Invalid {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new("."));
        settings.resolve_relative(base);
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Settings for a project: its own `cmide.toml`, else the global file,
    /// else defaults.
    pub fn load_for(project_root: &Path) -> Result<Self> {
        let local = project_root.join(CONFIG_FILE);
        if local.exists() {
            return Self::load_file(&local);
        }
        if let Some(global) = global_config_path()
            && global.exists()
        {
            return Self::load_file(&global);
        }
        Ok(Self::default())
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(dir) = self.toolchains.dir.as_mut() {
            resolve(dir);
        }
        if let Some(modules) = self.cmake.module_path.as_mut() {
            resolve(modules);
        }
    }

    pub fn cmake_path(&self) -> Option<&str> {
        non_empty(self.cmake.path.as_deref())
    }

    pub fn extra_args(&self) -> Option<&str> {
        non_empty(self.cmake.args.as_deref())
    }

    pub fn make_args(&self) -> &str {
        non_empty(self.cmake.make_args.as_deref()).unwrap_or("")
    }

    pub fn module_path(&self) -> Option<&Path> {
        self.cmake
            .module_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn toolchain_registry(&self) -> ToolchainRegistry {
        ToolchainRegistry::new(self.toolchains.dir.clone().unwrap_or_default())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `~/.cmide/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cmide").join("config.toml"))
}

//! The project model the orchestrator reports into.
//!
//! Setup runs only *request* things from the surrounding environment:
//! refresh the resource tree, copy generated metadata, mark build output as
//! derived, re-index. [`ProjectModel`] is that narrow interface. An IDE
//! integration implements it against its own resource model;
//! [`LocalProject`] implements it directly on the file system and keeps its
//! per-project state in `.cmide/state.toml`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Setting keys shared between the orchestrator and its callers.
pub mod keys {
    pub const ARCHITECTURE: &str = "architecture";
    pub const BUILD_TYPE: &str = "build_type";
    /// Cached absolute location; invalid once the metadata files are replaced.
    pub const ABSOLUTE_PROJECT_PATH: &str = "absolute_project_path";
}

/// A project on disk. Its root directory is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Project {
    name: String,
    root: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Open the project rooted at `dir`, named after the directory.
    pub fn open(dir: &Path) -> io::Result<Self> {
        let root = dir.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        Ok(Self { name, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub trait ProjectModel: Send + Sync {
    /// Pick up files created outside the model (the build directory).
    fn refresh(&self, _project: &Project) -> io::Result<()> {
        Ok(())
    }

    /// Flag generated output so it is not treated as source.
    fn mark_derived(&self, project: &Project, path: &Path) -> io::Result<()>;

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Replace `dst` with `src` only when the contents differ. Returns
    /// whether anything was written.
    fn overwrite_if_different(&self, src: &Path, dst: &Path) -> io::Result<bool>;

    fn reindex(&self, _project: &Project) -> io::Result<()> {
        Ok(())
    }

    fn get_setting(&self, project: &Project, key: &str) -> Option<String>;

    fn set_setting(&self, project: &Project, key: &str, value: &str) -> io::Result<()>;

    fn clear_setting(&self, project: &Project, key: &str) -> io::Result<()>;
}

pub const STATE_DIR: &str = ".cmide";
pub const STATE_FILE: &str = "state.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectState {
    #[serde(default)]
    settings: BTreeMap<String, String>,
    #[serde(default)]
    derived: BTreeSet<String>,
}

/// File-system backed [`ProjectModel`].
#[derive(Debug, Default)]
pub struct LocalProject {
    // Serializes read-modify-write of state files within this process.
    state_lock: Mutex<()>,
}

impl LocalProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_path(project: &Project) -> PathBuf {
        project.root().join(STATE_DIR).join(STATE_FILE)
    }

    /// Paths marked as derived, relative to the project root where possible.
    pub fn derived(&self, project: &Project) -> Vec<PathBuf> {
        match self.load(project) {
            Ok(state) => state.derived.iter().map(PathBuf::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn load(&self, project: &Project) -> io::Result<ProjectState> {
        let path = Self::state_path(project);
        if !path.exists() {
            return Ok(ProjectState::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn save(&self, project: &Project, state: &ProjectState) -> io::Result<()> {
        let path = Self::state_path(project);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    fn update(
        &self,
        project: &Project,
        change: impl FnOnce(&mut ProjectState),
    ) -> io::Result<()> {
        let _guard = self.state_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load(project)?;
        change(&mut state);
        self.save(project, &state)
    }
}

impl ProjectModel for LocalProject {
    fn refresh(&self, project: &Project) -> io::Result<()> {
        log::debug!("{}: nothing to refresh outside an IDE", project);
        Ok(())
    }

    fn mark_derived(&self, project: &Project, path: &Path) -> io::Result<()> {
        let relative = path.strip_prefix(project.root()).unwrap_or(path);
        let entry = relative.to_string_lossy().replace('\\', "/");
        self.update(project, |state| {
            state.derived.insert(entry);
        })
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst).map(|_| ())
    }

    fn overwrite_if_different(&self, src: &Path, dst: &Path) -> io::Result<bool> {
        let new_content = fs::read(src)?;
        if fs::read(dst).is_ok_and(|old| old == new_content) {
            return Ok(false);
        }
        fs::write(dst, new_content)?;
        Ok(true)
    }

    fn reindex(&self, project: &Project) -> io::Result<()> {
        log::debug!("{}: no index to rebuild outside an IDE", project);
        Ok(())
    }

    fn get_setting(&self, project: &Project, key: &str) -> Option<String> {
        let _guard = self.state_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.load(project) {
            Ok(state) => state.settings.get(key).cloned(),
            Err(e) => {
                log::warn!("{}: unreadable project state: {}", project, e);
                None
            }
        }
    }

    fn set_setting(&self, project: &Project, key: &str, value: &str) -> io::Result<()> {
        self.update(project, |state| {
            state.settings.insert(key.to_string(), value.to_string());
        })
    }

    fn clear_setting(&self, project: &Project, key: &str) -> io::Result<()> {
        if self.get_setting(project, key).is_none() {
            return Ok(());
        }
        self.update(project, |state| {
            state.settings.remove(key);
        })
    }
}

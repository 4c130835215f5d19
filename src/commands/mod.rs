//! CLI command handlers.
//!
//! Each submodule backs one `cmide` subcommand. They share a [`Workspace`]:
//! the opened project, its resolved configuration and its state store.

pub mod arch;
pub mod doctor;
pub mod generators;
pub mod setup;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::project::{LocalProject, Project, ProjectModel, keys};

/// A project opened from the command line.
pub struct Workspace {
    pub project: Project,
    pub settings: Settings,
    pub model: Arc<LocalProject>,
}

impl Workspace {
    pub fn open(dir: &Path) -> Result<Self> {
        let project = Project::open(dir)
            .with_context(|| format!("Failed to open project directory {}", dir.display()))?;
        let settings = Settings::load_for(project.root())?;
        log::debug!(
            "opened {} at {} (config: {})",
            project,
            project.root().display(),
            settings
                .source
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string())
        );
        Ok(Self {
            project,
            settings,
            model: Arc::new(LocalProject::new()),
        })
    }

    pub fn architecture(&self) -> Option<String> {
        self.model.get_setting(&self.project, keys::ARCHITECTURE)
    }

    pub fn build_type(&self) -> Option<String> {
        self.model.get_setting(&self.project, keys::BUILD_TYPE)
    }
}

//! Architecture and build type selection
//!
//! Handles `cmide arch` and `cmide build-type`.

use anyhow::{Result, bail};
use colored::*;
use inquire::Select;

use super::Workspace;
use crate::setup::{DEFAULT_ARCHITECTURE, SetupRequest};
use crate::ui;

/// Print every architecture with a toolchain file, marking the current one.
pub fn list(ws: &Workspace) {
    let registry = ws.settings.toolchain_registry();
    let descriptors = registry.descriptors();

    if descriptors.is_empty() {
        println!(
            "{} No toolchain files in {}",
            "!".yellow(),
            registry.dir().display()
        );
        println!(
            "   Builds go to {}/{}/ without a toolchain file.",
            ws.settings.build.bin_dir, DEFAULT_ARCHITECTURE
        );
        return;
    }

    let current = ws.architecture();
    let mut table = ui::Table::new(&["", "Architecture", "Toolchain file"]);
    for descriptor in descriptors {
        let active = current.as_deref() == Some(descriptor.architecture.as_str());
        let marker = if active { "✓".green().to_string() } else { String::new() };
        let name = if active {
            descriptor.architecture.green().bold().to_string()
        } else {
            descriptor.architecture.cyan().to_string()
        };
        table.add_row(vec![
            marker,
            name,
            descriptor.path.display().to_string().dimmed().to_string(),
        ]);
    }
    println!("{} Toolchains in {}", "🔧".blue(), registry.dir().display());
    table.print();
}

/// Resolve the architecture to switch to, asking when `name` is absent.
pub fn choose_architecture(ws: &Workspace, name: Option<String>) -> Result<SetupRequest> {
    if let Some(name) = name {
        return Ok(SetupRequest::ChangeArchitecture(name));
    }

    let registry = ws.settings.toolchain_registry();
    let architectures = registry.list_architectures();
    if architectures.is_empty() {
        bail!(
            "No toolchain.<arch>.cmake files found in {}",
            registry.dir().display()
        );
    }

    let starting = starting_cursor(&architectures, ws.architecture().as_deref());
    let choice = Select::new("Select architecture:", architectures)
        .with_starting_cursor(starting)
        .prompt()?;
    Ok(SetupRequest::ChangeArchitecture(choice))
}

/// Resolve the build type to switch to, asking when `name` is absent.
pub fn choose_build_type(ws: &Workspace, name: Option<String>) -> Result<SetupRequest> {
    if let Some(name) = name {
        return Ok(SetupRequest::ChangeBuildType(name));
    }

    let types = ws.settings.build.types.clone();
    if types.is_empty() {
        bail!("No build types configured ([build] types is empty)");
    }

    let starting = starting_cursor(&types, ws.build_type().as_deref());
    let choice = Select::new("Select build type:", types)
        .with_starting_cursor(starting)
        .prompt()?;
    Ok(SetupRequest::ChangeBuildType(choice))
}

fn starting_cursor(options: &[String], current: Option<&str>) -> usize {
    current
        .and_then(|c| options.iter().position(|o| o == c))
        .unwrap_or(0)
}

//! Doctor command handler
//!
//! Handles `cmide doctor`: checks that CMake runs and shows what a setup
//! would use.

use anyhow::Result;
use colored::*;

use super::Workspace;
use crate::command::{CommandLine, DEFAULT_CMAKE};
use crate::process::{CancelToken, CommandRunner, ProcessExecutor};
use crate::project::LocalProject;

/// Run the `cmide doctor` command to diagnose setup problems
pub fn run_doctor(ws: &Workspace) -> Result<()> {
    println!("{} Running Doctor...", "🚑".red());
    println!("-------------------------------");

    print!("Checking OS... ");
    println!(
        "{} ({})",
        std::env::consts::OS.green(),
        std::env::consts::ARCH.cyan()
    );

    let cmake = ws.settings.cmake_path().unwrap_or(DEFAULT_CMAKE);
    print!("Checking CMake ({})... ", cmake);
    let mut version = CommandLine::new(ws.settings.cmake_path());
    version.append("--version");
    match ProcessExecutor::new().run(&version, None, &CancelToken::new()) {
        Ok(result) if result.success() => {
            let first = result.stdout.lines().next().unwrap_or_default();
            println!("{} {}", "Found".green(), first.dimmed());
        }
        Ok(result) => println!("{} (exit code {})", "Broken".red(), result.exit_code),
        Err(e) => {
            log::debug!("cmake version check failed: {e}");
            println!("{}", "Not Found (Install CMake or set [cmake] path)".red());
        }
    }

    print!("Checking configuration... ");
    match &ws.settings.source {
        Some(path) => println!("{}", path.display().to_string().green()),
        None => println!("{}", "defaults".yellow()),
    }
    println!("  generator: {}", ws.settings.cmake.generator.cyan());
    if let Some(modules) = ws.settings.module_path() {
        println!("  module path: {}", modules.display());
    }

    let registry = ws.settings.toolchain_registry();
    print!("Checking toolchains... ");
    let architectures = registry.list_architectures();
    if architectures.is_empty() {
        println!(
            "{} in {}",
            "None (builds run without a toolchain file)".yellow(),
            registry.dir().display()
        );
    } else {
        println!(
            "{} in {}",
            architectures.join(", ").green(),
            registry.dir().display()
        );
    }

    println!("Project {}:", ws.project.to_string().bold());
    println!(
        "  architecture: {}",
        ws.architecture().unwrap_or_else(|| "(unset)".to_string()).cyan()
    );
    println!(
        "  build type:   {}",
        ws.build_type().unwrap_or_else(|| "(unset)".to_string()).cyan()
    );
    let derived = ws.model.derived(&ws.project);
    if !derived.is_empty() {
        println!("  derived:      {} path(s)", derived.len());
    }
    println!("  state file:   {}", LocalProject::state_path(&ws.project).display());

    Ok(())
}

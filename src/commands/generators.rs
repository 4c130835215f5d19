//! Handles `cmide generators`.

use anyhow::{Context, Result};
use colored::*;

use super::Workspace;
use crate::generators::discover_generators;
use crate::process::ProcessExecutor;

pub fn run(ws: &Workspace) -> Result<Vec<String>> {
    let cmake = ws.settings.cmake_path().unwrap_or(crate::command::DEFAULT_CMAKE);
    let generators = discover_generators(&ProcessExecutor::new(), ws.settings.cmake_path())
        .with_context(|| format!("Failed to query generators from {}", cmake))?;

    if generators.is_empty() {
        println!("{} {} offers no Eclipse generators", "!".yellow(), cmake);
        return Ok(generators);
    }

    println!("{} Eclipse generators offered by {}:", "📦".blue(), cmake);
    for generator in &generators {
        if *generator == ws.settings.cmake.generator {
            println!("  {} {}", "✓".green(), generator.green().bold());
        } else {
            println!("    {}", generator);
        }
    }
    Ok(generators)
}

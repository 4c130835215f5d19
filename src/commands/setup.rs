//! Setup command handler
//!
//! Handles `cmide setup`, `cmide arch <NAME>` and `cmide build-type <NAME>`:
//! every one of them regenerates the Eclipse project through CMake.

use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use super::Workspace;
use crate::console::{CommandReport, ConsoleReporter, Reporter};
use crate::process::ProcessExecutor;
use crate::project::{ProjectModel, keys};
use crate::setup::{SetupOrchestrator, SetupOutcome, SetupRequest, SetupService};

/// Prints reports above the spinner instead of through it.
struct SpinnerReporter {
    spinner: ProgressBar,
    inner: ConsoleReporter,
}

impl Reporter for SpinnerReporter {
    fn report(&self, report: &CommandReport) {
        self.spinner.suspend(|| self.inner.report(report));
    }
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Run `request` against the workspace project and remember the selection
/// it was configured with.
pub fn run(ws: &Workspace, request: SetupRequest, quiet: bool) -> Result<SetupOutcome> {
    let pb = spinner(format!("Running {} for {}...", request, ws.project))?;
    let reporter = SpinnerReporter {
        spinner: pb.clone(),
        inner: if quiet {
            ConsoleReporter::quiet()
        } else {
            ConsoleReporter::new()
        },
    };
    let service = SetupService::new(SetupOrchestrator::new(
        ws.settings.clone(),
        Arc::new(ProcessExecutor::new()),
        ws.model.clone(),
        Arc::new(reporter),
    ));

    let result = service.submit(ws.project.clone(), request).and_then(|task| task.join());

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            // Stderr has already been printed by the reporter.
            pb.finish_with_message(format!("{} {}", "x".red(), e));
            return Err(e.into());
        }
    };

    ws.model
        .set_setting(&ws.project, keys::ARCHITECTURE, &outcome.selection.architecture)?;
    ws.model
        .set_setting(&ws.project, keys::BUILD_TYPE, &outcome.selection.build_type)?;

    pb.finish_with_message(format!(
        "{} Configured {} for {} ({})",
        "✓".green(),
        ws.project.to_string().bold(),
        outcome.selection.architecture.cyan(),
        outcome.selection.build_type.cyan()
    ));
    print_outcome(&outcome);
    Ok(outcome)
}

fn print_outcome(outcome: &SetupOutcome) {
    for path in &outcome.reconciled {
        println!("   {} {}", "↻".green(), path.display());
    }
    for warning in &outcome.warnings {
        println!("   {} {}", "!".yellow(), warning.yellow());
    }
}

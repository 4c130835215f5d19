//! Where command output ends up.

use colored::*;

/// Everything a user needs to see about one CMake invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command_line: String,
    pub stdout: String,
    /// Stderr after noise filtering; empty when nothing is worth showing
    pub stderr: String,
    pub success: bool,
}

pub trait Reporter: Send + Sync {
    fn report(&self, report: &CommandReport);
}

/// Prints reports to the terminal: the command, its output, then any
/// remaining diagnostics in red.
#[derive(Debug)]
pub struct ConsoleReporter {
    show_stdout: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { show_stdout: true }
    }

    /// Only print the command line and diagnostics.
    pub fn quiet() -> Self {
        Self { show_stdout: false }
    }

    /// The text printed for `report`, without trailing newline.
    pub fn render(&self, report: &CommandReport) -> String {
        let marker = if report.success { "▶".green() } else { "x".red() };
        let mut out = format!("{} {}", marker, report.command_line.bold());

        let stdout = report.stdout.trim_end();
        if self.show_stdout && !stdout.is_empty() {
            out.push('\n');
            out.push_str(stdout);
        }
        if !report.stderr.is_empty() {
            out.push('\n');
            out.push_str(&report.stderr.red().to_string());
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, report: &CommandReport) {
        // One call, so concurrent runs do not interleave line by line.
        println!("{}", self.render(report));
    }
}

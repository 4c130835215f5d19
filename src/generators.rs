//! Eclipse generator discovery from `cmake --help`.
//!
//! The help text is an unversioned format, so parsing is best effort: any
//! drift simply yields fewer (or no) generators.

use crate::command::CommandLine;
use crate::process::{CancelToken, CommandRunner, ProcessError};
use regex::Regex;
use std::sync::LazyLock;

const SECTION_HEADER: &str = "Generators";

static ECLIPSE_GENERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Eclipse[^=]+)=").expect("generator pattern is valid")
});

/// Ask CMake for its generators and keep the Eclipse ones, in help order.
pub fn discover_generators(
    runner: &dyn CommandRunner,
    cmake: Option<&str>,
) -> Result<Vec<String>, ProcessError> {
    let mut command = CommandLine::new(cmake);
    command.append("--help");

    let result = runner.run(&command, None, &CancelToken::new())?;
    if !result.success() {
        log::warn!("`{}` exited with {}", command, result.exit_code);
    }
    Ok(parse_generators(&result.stdout))
}

/// Extract Eclipse generator names from the `Generators` section.
///
/// Each generator is an indented block; continuation lines are indented
/// deeper than the first line, which starts right at the section's indent.
pub fn parse_generators(help: &str) -> Vec<String> {
    let mut generators = Vec::new();
    let mut entry = String::new();
    let mut in_section = false;
    let mut indent: Option<usize> = None;

    for line in help.split('\n') {
        if !in_section {
            in_section = line.starts_with(SECTION_HEADER);
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            continue;
        }

        let width = *indent.get_or_insert_with(|| line.chars().take_while(|c| *c == ' ').count());
        if starts_entry(line, width) && !entry.is_empty() {
            flush_entry(&mut entry, &mut generators);
        }
        entry.push_str(line);
    }
    flush_entry(&mut entry, &mut generators);

    generators
}

fn starts_entry(line: &str, indent: usize) -> bool {
    line.get(indent..)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}

fn flush_entry(entry: &mut String, generators: &mut Vec<String>) {
    let merged: String = entry.chars().filter(|c| *c != '\r').collect();
    if let Some(caps) = ECLIPSE_GENERATOR.captures(merged.trim()) {
        generators.push(caps[1].trim().to_string());
    }
    entry.clear();
}

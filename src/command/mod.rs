//! CMake command-line assembly.
//!
//! A [`CommandLine`] is the executable followed by argument fragments joined
//! with single spaces. Fragments are appended as-is: whoever renders a
//! fragment is responsible for quoting the values inside it, using the
//! helpers in [`shell`].

pub mod shell;

use std::fmt;

/// Tool name used when no explicit CMake path is configured.
pub const DEFAULT_CMAKE: &str = "cmake";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    line: String,
}

impl CommandLine {
    /// Start a command from the configured executable, falling back to the
    /// bare `cmake` name resolved through the search path.
    pub fn new(executable: Option<&str>) -> Self {
        let executable = executable
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_CMAKE);
        Self {
            line: shell::quote_word(executable),
        }
    }

    /// Append one fragment exactly as given, preceded by a single space.
    /// Blank fragments are dropped so optional settings never leave double
    /// spaces behind.
    pub fn append(&mut self, fragment: impl AsRef<str>) -> &mut Self {
        let fragment = fragment.as_ref();
        if !fragment.trim().is_empty() {
            self.line.push(' ');
            self.line.push_str(fragment);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl AsRef<str> for CommandLine {
    fn as_ref(&self) -> &str {
        &self.line
    }
}

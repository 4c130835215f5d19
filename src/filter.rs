//! Noise filtering for CMake's stderr.
//!
//! The Eclipse generators warn whenever the build directory lives below the
//! source directory, which is exactly the layout this tool creates. That
//! warning is removed before stderr is shown; if nothing but the warning
//! header is left, the whole diagnostic is dropped.

use regex::Regex;
use std::sync::LazyLock;

static SIBLING_BUILD_DIR_WARNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\A(.*)The build directory is a subdirectory.*which is a sibling of the source directory\.(.*)\z",
    )
    .expect("sibling warning pattern is valid")
});

/// What remains of the warning once its body has been stripped.
const EMPTY_WARNING: &str = "CMake Warning in CMakeLists.txt:";

/// Strip known-benign diagnostics. An empty result means there is nothing
/// worth showing.
pub fn filter_error_output(raw: &str) -> String {
    let stripped = match SIBLING_BUILD_DIR_WARNING.captures(raw) {
        Some(caps) => {
            let before = caps.get(1).map_or("", |m| m.as_str());
            let after = caps.get(2).map_or("", |m| m.as_str());
            format!("{before}{after}")
        }
        None => raw.to_string(),
    };

    let trimmed = stripped.trim();
    if trimmed == EMPTY_WARNING {
        return String::new();
    }
    trimmed.to_string()
}

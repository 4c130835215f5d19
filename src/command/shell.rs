//! Quoting rules for values placed into a shell command line.
//!
//! Command lines run through `sh -c` on Unix and `cmd /C` on Windows, so
//! every value that ends up in a fragment goes through one of these two
//! functions:
//!
//! - [`quote_word`] for a value that stands on its own (architecture, build
//!   type, executable path). Plain tokens are returned untouched.
//! - [`escape_double_quoted`] for a value placed between double quotes that
//!   the template already provides (module path, toolchain file, generator).

/// Characters that never need quoting on the current platform.
fn is_plain(c: char) -> bool {
    if c.is_ascii_alphanumeric() {
        return true;
    }
    if cfg!(windows) {
        matches!(c, '_' | '-' | '.' | ',' | '/' | '\\' | ':' | '=' | '+' | '@')
    } else {
        matches!(c, '_' | '-' | '.' | ',' | '/' | ':' | '=' | '+' | '@' | '%')
    }
}

/// Whether `value` is safe to embed anywhere in a command line unquoted.
pub fn is_plain_word(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_plain)
}

/// Quote `value` as a single shell word if it contains anything special.
pub fn quote_word(value: &str) -> String {
    if is_plain_word(value) {
        return value.to_string();
    }
    if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

/// Escape `value` for use inside a double-quoted region of a command line.
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let needs_escape = if cfg!(windows) {
            c == '"'
        } else {
            matches!(c, '"' | '\\' | '$' | '`')
        };
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

//! `$NAME$` placeholder templates for CMake argument fragments.
//!
//! A template is scanned once, left to right. Each `$name$` token whose name
//! is bound is replaced by the bound value; the value is copied as literal
//! text and never scanned again, so a value that happens to contain `$X$`
//! stays exactly as given. Unbound placeholders are left in place, which lets
//! one set of bindings serve several templates that only use some of them.

use std::fmt;
use thiserror::Error;

/// Selects the Eclipse generator and the CDT version it targets.
pub const GENERATE_ECLIPSE_PROJECT: CommandTemplate = CommandTemplate::new(
    "-G \"$BUILD_SYS$\" -D_ECLIPSE_VERSION=$VERSION$ -DCMAKE_ECLIPSE_GENERATE_LINKED_RESOURCES=FALSE",
);

pub const SETUP_MODULE_PATH: CommandTemplate =
    CommandTemplate::new("-DCMAKE_MODULE_PATH=\"$PATH_TO_MODULES$\"");

pub const CMAKE_BUILD_TYPE: CommandTemplate =
    CommandTemplate::new("-DCMAKE_BUILD_TYPE=$BUILDTYPE$");

/// Per-architecture build directory, relative to the project root.
pub const ARCH_BIN_DIR: CommandTemplate = CommandTemplate::new("$BIN_DIR$/$ARCH$/");

pub const SETUP_BIN_DIR: CommandTemplate = CommandTemplate::new(
    "-H. -B$ARCH_BIN_DIR$ -DCMAKE_TOOLCHAIN_FILE=\"$PATH_TO_TOOLCHAIN_FILE$\" -DCMAKE_ECLIPSE_MAKE_ARGUMENTS=\"-C $ARCH_BIN_DIR$ $MAKE_ARGS$\"",
);

pub const SETUP_BIN_DIR_NO_TOOLCHAIN: CommandTemplate = CommandTemplate::new(
    "-H. -B$ARCH_BIN_DIR$ -DCMAKE_ECLIPSE_MAKE_ARGUMENTS=\"-C $ARCH_BIN_DIR$ $MAKE_ARGS$\"",
);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unresolved placeholders in `{template}`: {}", .names.join(", "))]
    Unresolved {
        template: String,
        names: Vec<String>,
    },
}

/// An immutable command-line template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    text: &'static str,
}

impl CommandTemplate {
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'static str {
        self.text
    }

    /// Names of all placeholders in the template, in order of appearance.
    pub fn placeholders(&self) -> Vec<&'static str> {
        tokens(self.text)
            .filter_map(|token| match token {
                Token::Placeholder(name) => Some(name),
                Token::Text(_) => None,
            })
            .collect()
    }

    /// Substitute bound placeholders, leaving unbound ones verbatim.
    pub fn render(&self, bindings: &[(&str, &str)]) -> String {
        render_str(self.text, bindings)
    }

    /// Like [`render`](Self::render), but every placeholder must be bound.
    pub fn render_strict(&self, bindings: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut names: Vec<String> = Vec::new();
        for name in self.placeholders() {
            let bound = bindings.iter().any(|(bound, _)| *bound == name);
            if !bound && !names.iter().any(|seen| seen == name) {
                names.push(name.to_string());
            }
        }

        if !names.is_empty() {
            return Err(TemplateError::Unresolved {
                template: self.text.to_string(),
                names,
            });
        }
        Ok(self.render(bindings))
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Substitute bound placeholders in an arbitrary string.
pub fn render_str(template: &str, bindings: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    for token in tokens(template) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Placeholder(name) => {
                match bindings.iter().find(|(bound, _)| *bound == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(name);
                        out.push('$');
                    }
                }
            }
        }
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a template into literal text and `$NAME$` tokens.
///
/// A `$` that does not open a well-formed `$NAME$` is plain text.
fn tokens(template: &str) -> impl Iterator<Item = Token<'_>> {
    let mut rest = template;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let mut search_from = 0;
        while let Some(offset) = rest[search_from..].find('$') {
            let start = search_from + offset;
            let after = &rest[start + 1..];
            let name_len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());

            if name_len > 0 && after[name_len..].starts_with('$') {
                if start > 0 {
                    let text = &rest[..start];
                    rest = &rest[start..];
                    return Some(Token::Text(text));
                }
                let name = &after[..name_len];
                rest = &after[name_len + 1..];
                return Some(Token::Placeholder(name));
            }
            search_from = start + 1;
        }

        let text = rest;
        rest = "";
        Some(Token::Text(text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_bound_placeholder() {
        let rendered = SETUP_BIN_DIR.render(&[
            ("ARCH_BIN_DIR", "bin/arm/"),
            ("PATH_TO_TOOLCHAIN_FILE", "/tc/toolchain.arm.cmake"),
            ("MAKE_ARGS", "-j4"),
        ]);
        assert_eq!(
            rendered,
            "-H. -Bbin/arm/ -DCMAKE_TOOLCHAIN_FILE=\"/tc/toolchain.arm.cmake\" -DCMAKE_ECLIPSE_MAKE_ARGUMENTS=\"-C bin/arm/ -j4\""
        );
        assert!(!rendered.contains('$'));
    }

    #[test]
    fn test_partial_bindings_leave_placeholders_verbatim() {
        let rendered = GENERATE_ECLIPSE_PROJECT.render(&[("BUILD_SYS", "Eclipse CDT4 - Ninja")]);
        assert!(rendered.starts_with("-G \"Eclipse CDT4 - Ninja\""));
        assert!(rendered.contains("-D_ECLIPSE_VERSION=$VERSION$"));
    }

    #[test]
    fn test_unused_bindings_are_ignored() {
        assert_eq!(
            CMAKE_BUILD_TYPE.render(&[("BUILDTYPE", "Debug"), ("ARCH", "arm")]),
            "-DCMAKE_BUILD_TYPE=Debug"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let rendered = render_str("$A$ $B$", &[("A", "$B$"), ("B", "x")]);
        assert_eq!(rendered, "$B$ x");
    }

    #[test]
    fn test_repeated_placeholder_is_replaced_everywhere() {
        let rendered = SETUP_BIN_DIR_NO_TOOLCHAIN
            .render(&[("ARCH_BIN_DIR", "bin/x86/"), ("MAKE_ARGS", "")]);
        assert_eq!(
            rendered,
            "-H. -Bbin/x86/ -DCMAKE_ECLIPSE_MAKE_ARGUMENTS=\"-C bin/x86/ \""
        );
    }

    #[test]
    fn test_lone_dollar_signs_are_text() {
        assert_eq!(render_str("cost $5 and $", &[]), "cost $5 and $");
        assert_eq!(render_str("a $$ b", &[]), "a $$ b");
        assert_eq!(render_str("$not a name$", &[("not", "x")]), "$not a name$");
    }

    #[test]
    fn test_placeholders_lists_names_in_order() {
        assert_eq!(
            SETUP_BIN_DIR.placeholders(),
            vec![
                "ARCH_BIN_DIR",
                "PATH_TO_TOOLCHAIN_FILE",
                "ARCH_BIN_DIR",
                "MAKE_ARGS"
            ]
        );
        assert_eq!(ARCH_BIN_DIR.placeholders(), vec!["BIN_DIR", "ARCH"]);
    }

    #[test]
    fn test_render_strict_reports_missing_names() {
        let err = ARCH_BIN_DIR.render_strict(&[("BIN_DIR", "bin")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unresolved {
                template: "$BIN_DIR$/$ARCH$/".to_string(),
                names: vec!["ARCH".to_string()],
            }
        );
        assert_eq!(
            ARCH_BIN_DIR
                .render_strict(&[("BIN_DIR", "bin"), ("ARCH", "arm")])
                .unwrap(),
            "bin/arm/"
        );
    }
}

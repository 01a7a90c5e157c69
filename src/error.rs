//! Error types for DX parsing and serialization.
//!
//! Every parse entry point returns [`Result`]; malformed input never panics.
//! Text codecs report the first offending line and stop there.
//!
//! ## Error Categories
//!
//! - **Header errors**: unclosed `[` or illegal characters in a Human V3 section name
//! - **Key/value errors**: missing `=`, empty key, unbalanced quotes
//! - **LLM errors**: unknown sigils, malformed section headers, rows wider than their schema
//! - **Machine errors**: unsupported envelope versions, structurally invalid envelopes
//!
//! ## Diagnostics
//!
//! Editors want a flat `{message, line, column, hint}` record rather than an enum.
//! [`Error::diagnostic`] produces one for any variant:
//!
//! ```rust
//! use dx_format::human;
//!
//! let err = human::from_str("[forge").unwrap_err();
//! let diag = err.diagnostic();
//! assert_eq!(diag.line, 1);
//! assert!(diag.hint.is_some());
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// All errors produced by the DX codecs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A `[...]` header that never closes or whose name has illegal characters.
    #[error("Malformed section header at line {line}, column {col}: {msg}{}", fmt_hint(.hint))]
    MalformedHeader {
        line: usize,
        col: usize,
        msg: String,
        hint: Option<String>,
    },

    /// A line that should be `key = value` but is not.
    #[error("Malformed key/value at line {line}, column {col}: {msg}{}", fmt_hint(.hint))]
    MalformedKeyValue {
        line: usize,
        col: usize,
        msg: String,
        hint: Option<String>,
    },

    /// A `#` line in the LLM format whose sigil is not `#c:`, `#:` or `#<id>(`.
    #[error("Unknown sigil '{sigil}' at line {line}, column {col}")]
    UnknownSigil {
        line: usize,
        col: usize,
        sigil: String,
    },

    /// An LLM section header that cannot be parsed, or a row with no header before it.
    #[error("Invalid section header at line {line}, column {col}: {msg}")]
    InvalidSectionHeader {
        line: usize,
        col: usize,
        msg: String,
    },

    /// A row carrying more cells than its section schema declares.
    #[error("Schema mismatch at line {line}: expected at most {expected} cells, found {found}")]
    SchemaMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A `^key` pointer with no matching reference definition.
    #[error("Undefined reference: ^{0}")]
    UndefinedReference(String),

    /// A machine envelope with a version other than 1.
    #[error("Unsupported machine envelope version: {0}")]
    UnsupportedVersion(u64),

    /// A machine envelope that is well-formed JSON but not a valid document.
    #[error("Invalid machine envelope: {0}")]
    InvalidEnvelope(String),

    /// Input bytes that are not UTF-8.
    #[error("Invalid UTF-8 at byte offset {offset}")]
    Utf8 { offset: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

fn fmt_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\nHelp: {}", h))
        .unwrap_or_default()
}

impl Error {
    /// Creates a header error with an editor hint.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dx_format::Error;
    ///
    /// let err = Error::malformed_header(3, 1, "unclosed section header", Some("add a closing ']'"));
    /// assert!(err.to_string().contains("line 3"));
    /// assert!(err.to_string().contains("Help:"));
    /// ```
    pub fn malformed_header(line: usize, col: usize, msg: &str, hint: Option<&str>) -> Self {
        Error::MalformedHeader {
            line,
            col,
            msg: msg.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    /// Creates a key/value error with an editor hint.
    pub fn malformed_key_value(line: usize, col: usize, msg: &str, hint: Option<&str>) -> Self {
        Error::MalformedKeyValue {
            line,
            col,
            msg: msg.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    pub fn unknown_sigil(line: usize, col: usize, sigil: &str) -> Self {
        Error::UnknownSigil {
            line,
            col,
            sigil: sigil.to_string(),
        }
    }

    pub fn invalid_section_header(line: usize, col: usize, msg: &str) -> Self {
        Error::InvalidSectionHeader {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    pub fn schema_mismatch(line: usize, expected: usize, found: usize) -> Self {
        Error::SchemaMismatch {
            line,
            expected,
            found,
        }
    }

    pub fn invalid_envelope<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidEnvelope(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dx_format::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Rewrites the line number of a positioned error.
    ///
    /// Row-level helpers report line 0 because they do not know where they are;
    /// the line-driven parsers stamp the real line on the way out.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Error::SchemaMismatch {
                expected, found, ..
            } => Error::SchemaMismatch {
                line,
                expected,
                found,
            },
            other => other,
        }
    }

    /// The 1-based line of the error, or 0 when the error is not tied to text.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Error::MalformedHeader { line, .. }
            | Error::MalformedKeyValue { line, .. }
            | Error::UnknownSigil { line, .. }
            | Error::InvalidSectionHeader { line, .. }
            | Error::SchemaMismatch { line, .. } => *line,
            _ => 0,
        }
    }

    /// The 1-based column of the error, or 0 when the error is not tied to text.
    #[must_use]
    pub fn column(&self) -> usize {
        match self {
            Error::MalformedHeader { col, .. }
            | Error::MalformedKeyValue { col, .. }
            | Error::UnknownSigil { col, .. }
            | Error::InvalidSectionHeader { col, .. } => *col,
            Error::SchemaMismatch { .. } => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Error::MalformedHeader { hint, .. } | Error::MalformedKeyValue { hint, .. } => {
                hint.as_deref()
            }
            _ => None,
        }
    }

    /// The bare message without position prefix or hint.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Error::MalformedHeader { msg, .. }
            | Error::MalformedKeyValue { msg, .. }
            | Error::InvalidSectionHeader { msg, .. } => msg.clone(),
            Error::UnknownSigil { sigil, .. } => format!("unknown sigil '{}'", sigil),
            Error::SchemaMismatch {
                expected, found, ..
            } => format!(
                "row has {} cells but the schema declares {}",
                found, expected
            ),
            Error::UndefinedReference(key) => format!("undefined reference ^{}", key),
            Error::UnsupportedVersion(v) => format!("unsupported machine envelope version {}", v),
            Error::InvalidEnvelope(msg) | Error::Custom(msg) => msg.clone(),
            Error::Utf8 { offset } => format!("invalid UTF-8 at byte offset {}", offset),
        }
    }

    /// Flattens the error into an editor-style diagnostic record.
    #[must_use]
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            message: self.message(),
            line: self.line(),
            column: self.column(),
            hint: self.hint().map(str::to_string),
        }
    }
}

/// Position-tagged error record handed to diagnostics renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub hint: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positioned_errors_expose_diagnostic() {
        let err = Error::malformed_key_value(4, 7, "empty key", Some("write a key before '='"));
        let diag = err.diagnostic();
        assert_eq!(diag.line, 4);
        assert_eq!(diag.column, 7);
        assert_eq!(diag.message, "empty key");
        assert_eq!(diag.hint.as_deref(), Some("write a key before '='"));
        assert_eq!(diag.to_string(), "4:7: empty key (hint: write a key before '=')");
    }

    #[test]
    fn test_unpositioned_errors_report_zero() {
        let err = Error::UnsupportedVersion(2);
        assert_eq!(err.line(), 0);
        assert_eq!(err.column(), 0);
        assert!(err.hint().is_none());
        assert!(err.to_string().contains("version: 2"));
    }

    #[test]
    fn test_at_line_only_rewrites_schema_mismatch() {
        let err = Error::schema_mismatch(0, 2, 3).at_line(9);
        assert_eq!(err.line(), 9);

        let other = Error::unknown_sigil(5, 1, "#!").at_line(9);
        assert_eq!(other.line(), 5);
    }

    #[test]
    fn test_display_includes_hint() {
        let err = Error::malformed_header(1, 1, "unclosed section header", Some("add ']'"));
        let text = err.to_string();
        assert!(text.contains("line 1, column 1"));
        assert!(text.contains("Help: add ']'"));
    }

    #[test]
    fn test_custom_wraps_foreign_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::custom(&json_err);
        assert_eq!(err, Error::Custom(json_err.to_string()));
        assert_eq!(err.message(), json_err.to_string());
        assert_eq!(err.diagnostic().line, 0);
    }
}

//! Format-agnostic entry points and collaborator result shapes.
//!
//! Every conversion is `parse(from)` followed by `serialize(to)`; the
//! document model is the only intermediate.
//!
//! ```rust
//! use dx_format::convert::{convert, Format};
//!
//! let llm = "#c:nm|dx\n#f(repo)\nhttps://example.com";
//! let human = convert(llm, Format::Llm, Format::Human).unwrap();
//! assert_eq!(human, "name = dx\n\n[forge]\nrepository = https://example.com\n");
//!
//! let back = convert(&human, Format::Human, Format::Llm).unwrap();
//! assert_eq!(back, llm);
//! ```
//!
//! Editor-style callers that want flags instead of `Result` use
//! [`ParseResult`] and [`TransformResult`]:
//!
//! ```rust
//! use dx_format::convert::{parse, Format, ParseResult};
//!
//! let result = ParseResult::from(parse("[forge", Format::Human));
//! assert!(!result.success);
//! assert_eq!(result.error.unwrap().line, 1);
//! ```

use crate::document::DxDocument;
use crate::error::Diagnostic;
use crate::{human, llm, machine, Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The three text representations of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Llm,
    Human,
    Machine,
}

impl Format {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Llm => "llm",
            Format::Human => "human",
            Format::Machine => "machine",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Accepts the names written by `Display` plus a few common aliases.
    ///
    /// ```rust
    /// use dx_format::convert::Format;
    ///
    /// assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
    /// assert_eq!("JSON".parse::<Format>().unwrap(), Format::Machine);
    /// assert!("yaml".parse::<Format>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "llm" | "dx" => Ok(Format::Llm),
            "human" | "v3" => Ok(Format::Human),
            "machine" | "json" => Ok(Format::Machine),
            other => Err(Error::custom(format!("unknown format '{}'", other))),
        }
    }
}

/// Parses `input` in the given format.
///
/// # Errors
///
/// Returns the parse error of the selected codec.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(input: &str, format: Format) -> Result<DxDocument> {
    match format {
        Format::Llm => llm::from_str(input),
        Format::Human => human::from_str(input),
        Format::Machine => machine::from_str(input),
    }
}

/// Serializes `doc` in the given format with default options.
///
/// # Errors
///
/// Only the Machine format can fail, see [`machine::to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize(doc: &DxDocument, format: Format) -> Result<String> {
    match format {
        Format::Llm => Ok(llm::to_string(doc)),
        Format::Human => Ok(human::to_string(doc)),
        Format::Machine => machine::to_string(doc),
    }
}

/// Re-encodes `input` from one format into another.
///
/// # Errors
///
/// Returns the parse error of `from` or the serialize error of `to`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert(input: &str, from: Format, to: Format) -> Result<String> {
    let doc = parse(input, from)?;
    serialize(&doc, to)
}

/// Outcome of a parse, flattened for diagnostics consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(skip)]
    pub document: Option<DxDocument>,
    pub error: Option<Diagnostic>,
}

impl From<Result<DxDocument>> for ParseResult {
    fn from(result: Result<DxDocument>) -> Self {
        match result {
            Ok(document) => ParseResult {
                success: true,
                document: Some(document),
                error: None,
            },
            Err(err) => ParseResult {
                success: false,
                document: None,
                error: Some(err.diagnostic()),
            },
        }
    }
}

/// Outcome of a conversion, flattened for diagnostics consumers.
///
/// `content` is empty when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub success: bool,
    pub content: String,
    pub error: Option<Diagnostic>,
}

impl From<Result<String>> for TransformResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(content) => TransformResult {
                success: true,
                content,
                error: None,
            },
            Err(err) => TransformResult {
                success: false,
                content: String::new(),
                error: Some(err.diagnostic()),
            },
        }
    }
}

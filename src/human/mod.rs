//! The Human V3 editable format.
//!
//! Human V3 is the view people actually edit: vertical `key = value` lines,
//! full key and section names, and `[section]` headers.
//!
//! ```text
//! name = dx
//! version = 0.0.1
//!
//! [stack]
//! js = javascript | bun | tsc
//!
//! [forge]
//! repository = https://example.com
//! container = none
//!
//! [driven] = id | name | active
//! alpha = 1 | true
//! beta = 2 | false
//!
//! [js.dependencies]
//! react = 18.2.0
//! ```
//!
//! - Lines before the first header are context.
//! - `[stack]` holds raw reference definitions.
//! - `[name]` is a single-row section written vertically.
//! - `[name] = Col | Col` starts a table whose rows are `key = cell | cell`.
//! - `[parent.child]` blocks fold into the parent section with `child_` prefixed keys.
//!
//! ## Examples
//!
//! ```rust
//! use dx_format::{human, DxValue};
//!
//! let doc = human::from_str("name = dx\n\n[forge]\nrepository = https://example.com\n").unwrap();
//! assert_eq!(doc.context().get("nm"), Some(&DxValue::from("dx")));
//! assert_eq!(doc.section("f").unwrap().schema(), ["repo"]);
//!
//! let text = human::to_string(&doc);
//! assert_eq!(text, "name = dx\n\n[forge]\nrepository = https://example.com\n");
//! ```

mod format;
mod parse;

use crate::document::DxDocument;
use crate::options::HumanOptions;
use crate::{DxValue, Result};

pub use format::needs_quotes;

/// Parses Human V3 text into a document.
///
/// # Errors
///
/// Returns the first [`Error::MalformedHeader`](crate::Error::MalformedHeader),
/// [`Error::MalformedKeyValue`](crate::Error::MalformedKeyValue) or
/// [`Error::SchemaMismatch`](crate::Error::SchemaMismatch), with a 1-based
/// line and column.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(input: &str) -> Result<DxDocument> {
    parse::HumanParser::new(input).parse()
}

/// Formats a document as Human V3 with default options.
#[must_use]
pub fn to_string(doc: &DxDocument) -> String {
    to_string_with_options(doc, &HumanOptions::default())
}

/// Formats a document as Human V3.
///
/// # Examples
///
/// ```rust
/// use dx_format::{human, DocumentBuilder, DxValue, HumanOptions};
///
/// let mut builder = DocumentBuilder::new();
/// builder.context("nm", DxValue::from("dx"));
/// let doc = builder.build();
///
/// let options = HumanOptions::new().with_expand_keys(false);
/// assert_eq!(human::to_string_with_options(&doc, &options), "nm = dx\n");
/// ```
#[must_use]
pub fn to_string_with_options(doc: &DxDocument, options: &HumanOptions) -> String {
    let mut formatter = format::HumanFormatter::new(options);
    formatter.write_document(doc);
    formatter.into_inner()
}

/// Parses the right-hand side of a `key = value` line.
///
/// Rules apply in order: `-` and `~` are null, `true`/`false` are booleans,
/// two or more ` | ` separated items form an array, quoted text is a string,
/// canonical numbers are numbers, `^key` is a reference, and anything else is
/// a string.
///
/// # Examples
///
/// ```rust
/// use dx_format::{human, DxValue};
///
/// assert_eq!(human::parse_value("-"), DxValue::Null);
/// assert_eq!(human::parse_value("~"), DxValue::Null);
/// assert_eq!(human::parse_value("none"), DxValue::from("none"));
/// assert_eq!(human::parse_value("\"hello world\""), DxValue::from("hello world"));
/// assert_eq!(
///     human::parse_value("a | 2"),
///     DxValue::Array(vec![DxValue::from("a"), DxValue::from(2)])
/// );
/// ```
#[must_use]
pub fn parse_value(text: &str) -> DxValue {
    parse::parse_value(text)
}

/// Renders a value the way the formatter writes it after `key = `.
///
/// # Examples
///
/// ```rust
/// use dx_format::{human, DxValue};
///
/// assert_eq!(human::format_value(&DxValue::Null), "-");
/// assert_eq!(human::format_value(&DxValue::from("hello world")), "\"hello world\"");
/// assert_eq!(human::format_value(&DxValue::from("42")), "\"42\"");
/// assert_eq!(human::format_value(&DxValue::from(42)), "42");
/// ```
#[must_use]
pub fn format_value(value: &DxValue) -> String {
    let mut out = String::new();
    format::write_value(&mut out, value);
    out
}

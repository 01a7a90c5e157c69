//! # dx_format
//!
//! Codecs for DX documents: one semantic document, three representations.
//!
//! ## What is DX?
//!
//! A DX document is a small configuration-and-tables model: top-level
//! context values, named reference definitions and a set of sections (tables
//! with a schema and rows). The same document can be written three ways:
//!
//! - **LLM**: a token-dense sigil format for storage and model prompts
//! - **Human V3**: a vertical `key = value` format people edit
//! - **Machine**: a structural JSON envelope for tools
//!
//! Keys and section names are abbreviated in storage (`nm`, `f`) and expanded
//! in the human view (`name`, `forge`) through static dictionaries.
//!
//! ## Quick Start
//!
//! ```rust
//! use dx_format::{human, llm, DxValue};
//!
//! let input = "\
//! name = dx
//! version = 0.0.1
//!
//! [forge]
//! repository = https://example.com
//! container = none
//! ";
//!
//! let doc = human::from_str(input).unwrap();
//! assert_eq!(doc.context().get("v"), Some(&DxValue::from("0.0.1")));
//!
//! let forge = doc.section("f").unwrap();
//! assert_eq!(forge.schema(), ["repo", "cont"]);
//!
//! let dense = llm::to_string(&doc);
//! assert_eq!(dense, "#c:nm|dx;v|0.0.1\n#f(repo|cont)\nhttps://example.com|none");
//! assert_eq!(llm::from_str(&dense).unwrap(), doc);
//! ```
//!
//! ### Tables
//!
//! ```rust
//! use dx_format::{human, DxValue};
//!
//! let doc = human::from_str("[driven] = id | name\nalpha = first\nbeta = second\n").unwrap();
//! let driven = doc.section("d").unwrap();
//! assert_eq!(driven.rows().len(), 2);
//! assert_eq!(driven.get(1, "nm"), Some(&DxValue::from("second")));
//! ```
//!
//! ### Converting Between Formats
//!
//! ```rust
//! use dx_format::convert::{convert, Format};
//!
//! let human = convert("#c:nm|dx", Format::Llm, Format::Human).unwrap();
//! assert_eq!(human, "name = dx\n");
//! ```
//!
//! ## Round Trips
//!
//! For documents every format can express, `parse(serialize(doc)) == doc`
//! holds for each codec and serializing twice is byte-identical. The Machine
//! envelope is lossless for every document.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - No panics on malformed input; every parser returns [`Result`]
//! - Errors carry 1-based line and column plus an editor hint where useful
//!
//! ## Logging
//!
//! Non-fatal events (duplicate keys, section ids claimed by two names) are
//! reported through `tracing` at `warn` level. The crate never installs a
//! subscriber.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`convert.rs`** - one document in all three formats
//! - **`nested_sections.rs`** - `[parent.child]` folding and tables
//! - **`machine_envelope.rs`** - the JSON envelope and error diagnostics
//!
//! Run any example with: `cargo run --example <name>`

pub mod abbrev;
pub mod convert;
pub mod document;
pub mod error;
pub mod human;
pub mod llm;
pub mod machine;
pub mod macros;
pub mod map;
pub mod options;
pub mod value;

pub use document::{DocumentBuilder, DxDocument, DxSection, SectionSlot, Slot};
pub use error::{Diagnostic, Error, Result};
pub use map::OrderedMap;
pub use options::{AutoRefs, HumanOptions, LlmOptions};
pub use value::DxValue;

use std::io;

/// Parses Human V3 text. Shorthand for [`human::from_str`].
///
/// # Errors
///
/// Returns the first syntax error with its line and column.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(input: &str) -> Result<DxDocument> {
    human::from_str(input)
}

/// Parses Human V3 from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
///
/// let doc = dx_format::from_reader(Cursor::new("name = dx\n")).unwrap();
/// assert_eq!(doc.context().len(), 1);
/// ```
///
/// # Errors
///
/// Returns [`Error::Utf8`] for invalid bytes, [`Error::Custom`] if reading
/// fails, otherwise the errors of [`human::from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<DxDocument>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::custom(format!("I/O error: {}", e)))?;
    from_slice(&bytes)
}

/// Parses Human V3 from bytes.
///
/// # Errors
///
/// Returns [`Error::Utf8`] with the offset of the first invalid byte,
/// otherwise the errors of [`human::from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(bytes: &[u8]) -> Result<DxDocument> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::Utf8 {
        offset: e.valid_up_to(),
    })?;
    human::from_str(text)
}

/// Formats a document as Human V3. Shorthand for [`human::to_string`].
#[must_use]
pub fn to_string(doc: &DxDocument) -> String {
    human::to_string(doc)
}

/// Writes a document as Human V3 to an I/O stream.
///
/// # Errors
///
/// Returns [`Error::Custom`] if writing fails.
pub fn to_writer<W>(mut writer: W, doc: &DxDocument) -> Result<()>
where
    W: io::Write,
{
    writer
        .write_all(human::to_string(doc).as_bytes())
        .map_err(|e| Error::custom(format!("I/O error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_and_writer_round_trip() {
        let doc = from_str("name = dx\n\n[forge]\nrepository = r\n").unwrap();
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &doc).unwrap();
        assert_eq!(from_reader(buffer.as_slice()).unwrap(), doc);
    }

    #[test]
    fn test_from_slice_reports_utf8_offset() {
        assert_eq!(
            from_slice(b"name = \xc3").unwrap_err(),
            Error::Utf8 { offset: 7 }
        );
    }

    #[test]
    fn test_empty_input() {
        let doc = from_str("").unwrap();
        assert!(doc.context().is_empty());
        assert!(doc.refs().is_empty());
        assert_eq!(doc.section_count(), 0);
        assert_eq!(to_string(&doc), "");
    }
}

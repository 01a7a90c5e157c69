//! The LLM storage format.
//!
//! A line-oriented, sigil-prefixed format designed to spend as few tokens as
//! possible:
//!
//! ```text
//! #c:nm|dx;v|0.0.1          context line
//! #:js|javascript|bun       reference definition (raw text)
//! #d(id|nm|ac)              section header
//! 1|alpha|+                 data row of the most recent header
//! ```
//!
//! Values are written with one-character sigils: `+`/`-` for booleans, `~` for
//! null, `*a,b,c` for arrays and `^key` for references. Anything else is a
//! number when it has the canonical shape accepted by
//! [`parse_number`](crate::value::parse_number) and a string otherwise.
//!
//! ## Examples
//!
//! ```rust
//! use dx_format::{llm, DxValue};
//!
//! let doc = llm::from_str("#c:nm|dx\n#d(id|ac)\n1|+\n2|-").unwrap();
//! let rows = doc.section("d").unwrap().rows();
//! assert_eq!(rows[1], vec![DxValue::from(2), DxValue::Bool(false)]);
//!
//! assert_eq!(llm::to_string(&doc), "#c:nm|dx\n#d(id|ac)\n1|+\n2|-");
//! ```

use crate::document::{DocumentBuilder, DxDocument, DxSection};
use crate::options::{AutoRefs, LlmOptions};
use crate::value::{format_number, parse_number};
use crate::{DxValue, Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parses LLM text into a document.
///
/// # Errors
///
/// Stops at the first offending line with [`Error::UnknownSigil`],
/// [`Error::InvalidSectionHeader`], [`Error::MalformedKeyValue`] or
/// [`Error::SchemaMismatch`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(input: &str) -> Result<DxDocument> {
    LlmParser::new(input).parse()
}

/// Parses LLM bytes, rejecting invalid UTF-8 with its byte offset.
///
/// # Examples
///
/// ```rust
/// use dx_format::{llm, Error};
///
/// let err = llm::parse_bytes(b"#c:nm|\xff").unwrap_err();
/// assert_eq!(err, Error::Utf8 { offset: 6 });
/// ```
///
/// # Errors
///
/// Returns [`Error::Utf8`] for invalid bytes, otherwise the errors of [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_bytes(input: &[u8]) -> Result<DxDocument> {
    let text = std::str::from_utf8(input).map_err(|e| Error::Utf8 {
        offset: e.valid_up_to(),
    })?;
    from_str(text)
}

/// Serializes a document to LLM text.
///
/// The empty document produces the empty string. The output never ends with
/// a newline.
#[must_use]
pub fn to_string(doc: &DxDocument) -> String {
    to_string_with_options(doc, &LlmOptions::default())
}

/// Serializes a document to LLM text with custom options.
///
/// # Examples
///
/// ```rust
/// use dx_format::{llm, AutoRefs, DocumentBuilder, DxValue, LlmOptions};
///
/// let mut builder = DocumentBuilder::new();
/// builder.context("au", DxValue::from("essensefromexistence"));
/// builder.context("ow", DxValue::from("essensefromexistence"));
/// let doc = builder.build();
///
/// let options = LlmOptions::new().with_auto_refs(AutoRefs::new(8, 2));
/// assert_eq!(
///     llm::to_string_with_options(&doc, &options),
///     "#c:au|^A;ow|^A\n#:A|essensefromexistence"
/// );
/// ```
#[must_use]
pub fn to_string_with_options(doc: &DxDocument, options: &LlmOptions) -> String {
    let hoisted = options
        .auto_refs
        .map(|rule| hoist_strings(doc, rule))
        .unwrap_or_default();
    let mut serializer = LlmSerializer::new(hoisted);
    serializer.write_document(doc);
    serializer.into_inner()
}

/// Decodes one LLM value token.
///
/// # Examples
///
/// ```rust
/// use dx_format::{llm, DxValue};
///
/// assert_eq!(llm::parse_value("+"), DxValue::Bool(true));
/// assert_eq!(llm::parse_value("~"), DxValue::Null);
/// assert_eq!(llm::parse_value("^js"), DxValue::Ref("js".into()));
/// assert_eq!(llm::parse_value("*a,1"), DxValue::Array(vec!["a".into(), 1.into()]));
/// assert_eq!(llm::parse_value("0.0.1"), DxValue::from("0.0.1"));
/// ```
#[must_use]
pub fn parse_value(token: &str) -> DxValue {
    let token = token.trim();
    match token {
        "+" => return DxValue::Bool(true),
        "-" => return DxValue::Bool(false),
        "~" => return DxValue::Null,
        _ => {}
    }
    if let Some(key) = token.strip_prefix('^') {
        return DxValue::Ref(key.to_string());
    }
    if let Some(body) = token.strip_prefix('*') {
        if body.trim().is_empty() {
            return DxValue::Array(Vec::new());
        }
        return DxValue::Array(body.split(',').map(parse_value).collect());
    }
    match parse_number(token) {
        Some(n) => DxValue::Number(n),
        None => DxValue::String(token.to_string()),
    }
}

/// Encodes one value as an LLM token.
#[must_use]
pub fn format_value(value: &DxValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, &HashMap::new());
    out
}

fn write_value(out: &mut String, value: &DxValue, hoisted: &HashMap<&str, String>) {
    match value {
        DxValue::String(s) => match hoisted.get(s.as_str()) {
            Some(key) => {
                out.push('^');
                out.push_str(key);
            }
            None => out.push_str(s),
        },
        DxValue::Number(n) => out.push_str(&format_number(*n)),
        DxValue::Bool(true) => out.push('+'),
        DxValue::Bool(false) => out.push('-'),
        DxValue::Null => out.push('~'),
        DxValue::Array(items) => {
            out.push('*');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, hoisted);
            }
        }
        DxValue::Ref(key) => {
            out.push('^');
            out.push_str(key);
        }
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct LlmParser<'a> {
    input: &'a str,
    builder: DocumentBuilder,
    current: Option<String>,
    line: usize,
    indent: usize,
}

impl<'a> LlmParser<'a> {
    fn new(input: &'a str) -> Self {
        LlmParser {
            input,
            builder: DocumentBuilder::new(),
            current: None,
            line: 0,
            indent: 0,
        }
    }

    fn parse(mut self) -> Result<DxDocument> {
        let input = self.input;
        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            self.line = idx + 1;
            self.indent = raw.chars().count() - raw.trim_start().chars().count();
            self.parse_line(line)?;
        }

        let doc = self.builder.build();
        debug!(
            context = doc.context().len(),
            refs = doc.refs().len(),
            sections = doc.section_count(),
            "parsed llm document"
        );
        Ok(doc)
    }

    /// 1-based column of a char offset within the trimmed line.
    fn col(&self, offset: usize) -> usize {
        self.indent + offset + 1
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        if let Some(body) = line.strip_prefix("#c:") {
            self.current = None;
            return self.parse_context(body);
        }
        if let Some(body) = line.strip_prefix("#:") {
            return self.parse_reference(body);
        }
        if let Some(body) = line.strip_prefix('#') {
            if body.starts_with(is_id_char) {
                return self.parse_header(body);
            }
            let sigil: String = line.chars().take(2).collect();
            return Err(Error::unknown_sigil(self.line, self.col(0), &sigil));
        }
        self.parse_row(line)
    }

    fn parse_context(&mut self, body: &str) -> Result<()> {
        for pair in body.split(';') {
            if pair.trim().is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('|').ok_or_else(|| {
                Error::malformed_key_value(
                    self.line,
                    self.col(0),
                    &format!("expected key|value in context, found '{}'", pair.trim()),
                    Some("separate each key from its value with '|'"),
                )
            })?;
            let key = key.trim();
            if self.builder.context(key, parse_value(value)).is_some() {
                warn!(key, line = self.line, "duplicate context key, keeping the later value");
            }
        }
        Ok(())
    }

    fn parse_reference(&mut self, body: &str) -> Result<()> {
        self.current = None;
        let (key, raw) = body.split_once('|').ok_or_else(|| {
            Error::malformed_key_value(
                self.line,
                self.col(0),
                "expected #:key|value",
                Some("separate the reference key from its value with '|'"),
            )
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::malformed_key_value(
                self.line,
                self.col(2),
                "empty reference key",
                None,
            ));
        }
        self.builder.stack_slot();
        self.builder.reference(key, raw.trim());
        Ok(())
    }

    /// `body` is the header without its leading `#`.
    fn parse_header(&mut self, body: &str) -> Result<()> {
        let open = body.find('(').ok_or_else(|| {
            Error::invalid_section_header(self.line, self.col(0), "missing '(' after section id")
        })?;
        let id = &body[..open];
        if let Some(pos) = id.chars().position(|c| !is_id_char(c)) {
            return Err(Error::invalid_section_header(
                self.line,
                self.col(pos + 1),
                "section id may only contain letters, digits and '_'",
            ));
        }
        if !body.ends_with(')') {
            return Err(Error::invalid_section_header(
                self.line,
                self.col(body.chars().count()),
                "section header must end with ')'",
            ));
        }
        let inner = &body[open + 1..body.len() - 1];
        if inner.contains(['(', ')']) {
            return Err(Error::invalid_section_header(
                self.line,
                self.col(open + 2),
                "unbalanced parentheses in schema",
            ));
        }

        let mut schema: Vec<String> = Vec::new();
        if !inner.trim().is_empty() {
            for column in inner.split('|').map(str::trim) {
                if column.is_empty() {
                    return Err(Error::invalid_section_header(
                        self.line,
                        self.col(open + 2),
                        "empty column name in schema",
                    ));
                }
                if schema.iter().any(|c| c == column) {
                    return Err(Error::invalid_section_header(
                        self.line,
                        self.col(open + 2),
                        &format!("duplicate column '{}' in schema", column),
                    ));
                }
                schema.push(column.to_string());
            }
        }

        if self.builder.section(DxSection::new(id, schema)).is_some() {
            warn!(id, line = self.line, "section redefined, replacing earlier rows");
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    fn parse_row(&mut self, line: &str) -> Result<()> {
        let section = self
            .current
            .as_deref()
            .and_then(|id| self.builder.section_mut(id))
            .ok_or_else(|| {
                Error::invalid_section_header(
                    self.line,
                    self.indent + 1,
                    "data row without a preceding section header",
                )
            })?;
        let cells = line.split('|').map(parse_value).collect();
        section.push_row(cells).map_err(|e| e.at_line(self.line))
    }
}

/// Picks the strings to replace with generated reference keys.
///
/// Strings are counted in document order; keys are handed out in the order
/// each qualifying string first appears and never collide with existing refs.
fn hoist_strings(doc: &DxDocument, rule: AutoRefs) -> HashMap<&str, String> {
    fn count<'d>(value: &'d DxValue, counts: &mut IndexMap<&'d str, usize>) {
        match value {
            DxValue::String(s) => *counts.entry(s.as_str()).or_insert(0) += 1,
            DxValue::Array(items) => items.iter().for_each(|item| count(item, counts)),
            _ => {}
        }
    }

    let mut counts = IndexMap::new();
    for value in doc.context().values() {
        count(value, &mut counts);
    }
    for section in doc.sections() {
        for value in section.rows().iter().flatten() {
            count(value, &mut counts);
        }
    }

    let mut keys = (0..).map(ref_key).filter(|k| !doc.refs().contains_key(k));
    counts
        .into_iter()
        .filter(|(s, n)| *n >= rule.min_count.max(1) && s.chars().count() >= rule.min_length)
        .filter_map(|(s, _)| keys.next().map(|key| (s, key)))
        .collect()
}

/// Spreadsheet-style key for the `n`th generated reference: `A`..`Z`, `AA`, `AB`, ...
fn ref_key(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

struct LlmSerializer<'a> {
    output: String,
    hoisted: HashMap<&'a str, String>,
}

impl<'a> LlmSerializer<'a> {
    fn new(hoisted: HashMap<&'a str, String>) -> Self {
        LlmSerializer {
            output: String::with_capacity(256),
            hoisted,
        }
    }

    fn into_inner(self) -> String {
        self.output
    }

    fn newline(&mut self) {
        if !self.output.is_empty() {
            self.output.push('\n');
        }
    }

    fn write_document(&mut self, doc: &DxDocument) {
        if !doc.context().is_empty() {
            self.output.push_str("#c:");
            for (i, (key, value)) in doc.context().iter().enumerate() {
                if i > 0 {
                    self.output.push(';');
                }
                self.output.push_str(key);
                self.output.push('|');
                write_value(&mut self.output, value, &self.hoisted);
            }
        }

        for (key, raw) in doc.refs() {
            self.newline();
            self.output.push_str("#:");
            self.output.push_str(key);
            self.output.push('|');
            self.output.push_str(raw);
        }

        if !self.hoisted.is_empty() {
            let mut generated: Vec<(String, String)> = self
                .hoisted
                .iter()
                .map(|(s, key)| (key.clone(), (*s).to_string()))
                .collect();
            generated.sort_by(|(a, _), (b, _)| (a.len(), a).cmp(&(b.len(), b)));
            for (key, raw) in generated {
                self.newline();
                self.output.push_str("#:");
                self.output.push_str(&key);
                self.output.push('|');
                self.output.push_str(&raw);
            }
        }

        for section in doc.sections() {
            self.write_section(section);
        }
    }

    fn write_section(&mut self, section: &DxSection) {
        self.newline();
        self.output.push('#');
        self.output.push_str(section.id());
        self.output.push('(');
        self.output.push_str(&section.schema().join("|"));
        self.output.push(')');

        for row in section.rows() {
            self.newline();
            for (i, value) in row.iter().enumerate() {
                if i > 0 {
                    self.output.push('|');
                }
                write_value(&mut self.output, value, &self.hoisted);
            }
        }
    }
}

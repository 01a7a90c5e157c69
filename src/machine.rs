//! The Machine interchange envelope.
//!
//! A structural, lossless mirror of [`DxDocument`] meant for tools rather
//! than people:
//!
//! ```json
//! {
//!   "version": 1,
//!   "context": {"nm": {"t": "s", "v": "dx"}},
//!   "refs": {"js": "javascript|bun"},
//!   "sections": [{"id": "f", "schema": ["repo"], "rows": [[{"t": "s", "v": "r"}]]}],
//!   "order": [{"slot": "stack"}, {"slot": "section", "id": "f"}]
//! }
//! ```
//!
//! Values are tagged pairs (see [`DxValue`]). `order` records where the
//! reference block sits; it is omitted when empty and optional on input.
//!
//! ## Examples
//!
//! ```rust
//! use dx_format::{llm, machine};
//!
//! let doc = llm::from_str("#c:nm|dx\n#d(id|ac)\n1|+").unwrap();
//! let json = machine::to_string(&doc).unwrap();
//! assert_eq!(machine::from_str(&json).unwrap(), doc);
//! ```

use crate::document::{DocumentBuilder, DxDocument, DxSection, SectionSlot};
use crate::map::OrderedMap;
use crate::{DxValue, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// The only envelope version this crate reads and writes.
pub const VERSION: u64 = 1;

/// The envelope root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDocument {
    pub version: u64,
    #[serde(default)]
    pub context: OrderedMap<DxValue>,
    #[serde(default)]
    pub refs: OrderedMap<String>,
    #[serde(default)]
    pub sections: Vec<MachineSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<MachineSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSection {
    pub id: String,
    pub schema: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<DxValue>>,
}

/// One entry of the envelope's section order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "lowercase")]
pub enum MachineSlot {
    Section { id: String },
    Stack,
}

impl From<&SectionSlot> for MachineSlot {
    fn from(slot: &SectionSlot) -> Self {
        match slot {
            SectionSlot::Section(id) => MachineSlot::Section { id: id.clone() },
            SectionSlot::Stack => MachineSlot::Stack,
        }
    }
}

impl From<MachineSlot> for SectionSlot {
    fn from(slot: MachineSlot) -> Self {
        match slot {
            MachineSlot::Section { id } => SectionSlot::Section(id),
            MachineSlot::Stack => SectionSlot::Stack,
        }
    }
}

/// Mirrors a document into an envelope.
///
/// Sections are listed in document order; the order list is written in full.
#[must_use]
pub fn to_envelope(doc: &DxDocument) -> MachineDocument {
    let sections: Vec<MachineSection> = doc
        .sections()
        .map(|s| MachineSection {
            id: s.id().to_string(),
            schema: s.schema().to_vec(),
            rows: s.rows().to_vec(),
        })
        .collect();

    let mut order: Vec<MachineSlot> = doc.section_order().iter().map(MachineSlot::from).collect();
    for section in &sections {
        let slot = MachineSlot::Section {
            id: section.id.clone(),
        };
        if !order.contains(&slot) {
            order.push(slot);
        }
    }

    MachineDocument {
        version: VERSION,
        context: doc.context().clone(),
        refs: doc.refs().clone(),
        sections,
        order,
    }
}

/// Rebuilds a document from an envelope.
///
/// # Errors
///
/// - [`Error::UnsupportedVersion`] when `version` is not 1
/// - [`Error::InvalidEnvelope`] for duplicate section ids, duplicate schema
///   columns, rows wider than their schema, or order entries naming no section
///
/// Short rows are padded with `Null`.
pub fn from_envelope(envelope: MachineDocument) -> Result<DxDocument> {
    if envelope.version != VERSION {
        return Err(Error::UnsupportedVersion(envelope.version));
    }

    let mut builder = DocumentBuilder::new();
    for (key, value) in envelope.context {
        builder.context(key, value);
    }
    for (key, raw) in envelope.refs {
        builder.reference(key, raw);
    }

    let ids: HashSet<&str> = envelope.sections.iter().map(|s| s.id.as_str()).collect();
    if ids.len() != envelope.sections.len() {
        return Err(Error::invalid_envelope("duplicate section id"));
    }
    for slot in &envelope.order {
        if let MachineSlot::Section { id } = slot {
            if !ids.contains(id.as_str()) {
                return Err(Error::invalid_envelope(format!(
                    "order names unknown section '{}'",
                    id
                )));
            }
        }
    }
    for slot in envelope.order {
        if !builder.slot(slot.into()) {
            return Err(Error::invalid_envelope("order lists a slot twice"));
        }
    }

    for raw in envelope.sections {
        let unique: HashSet<&str> = raw.schema.iter().map(String::as_str).collect();
        if unique.len() != raw.schema.len() {
            return Err(Error::invalid_envelope(format!(
                "section '{}' repeats a schema column",
                raw.id
            )));
        }
        let mut section = DxSection::new(raw.id, raw.schema);
        for (i, row) in raw.rows.into_iter().enumerate() {
            section.push_row(row).map_err(|_| {
                Error::invalid_envelope(format!(
                    "row {} of section '{}' is wider than its schema",
                    i,
                    section.id()
                ))
            })?;
        }
        builder.section(section);
    }

    let doc = builder.build();
    debug!(sections = doc.section_count(), "decoded machine envelope");
    Ok(doc)
}

/// Serializes a document as envelope JSON.
///
/// # Errors
///
/// Returns [`Error::Custom`] if `serde_json` fails. Non-finite numbers are
/// written as `null` and do not read back.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(doc: &DxDocument) -> Result<String> {
    serde_json::to_string(&to_envelope(doc)).map_err(Error::custom)
}

/// Serializes a document as indented envelope JSON.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(doc: &DxDocument) -> Result<String> {
    serde_json::to_string_pretty(&to_envelope(doc)).map_err(Error::custom)
}

/// Parses envelope JSON into a document.
///
/// The version is checked before the rest of the envelope, so a future
/// envelope with a different shape still reports [`Error::UnsupportedVersion`].
///
/// # Examples
///
/// ```rust
/// use dx_format::{machine, Error};
///
/// let err = machine::from_str(r#"{"version": 2, "sections": "??"}"#).unwrap_err();
/// assert_eq!(err, Error::UnsupportedVersion(2));
/// ```
///
/// # Errors
///
/// [`Error::InvalidEnvelope`] for malformed JSON or a missing version, plus
/// the errors of [`from_envelope`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(input: &str) -> Result<DxDocument> {
    let json: serde_json::Value = serde_json::from_str(input).map_err(Error::invalid_envelope)?;
    check_version(
        json.get("version")
            .ok_or_else(|| Error::invalid_envelope("missing 'version'"))?,
    )?;
    let envelope: MachineDocument = serde_json::from_value(json).map_err(Error::invalid_envelope)?;
    from_envelope(envelope)
}

/// Only the JSON integer `1` is accepted. Other whole numbers, including
/// `2.0` and `"2"`, are [`Error::UnsupportedVersion`]; anything else is
/// [`Error::InvalidEnvelope`].
fn check_version(version: &serde_json::Value) -> Result<()> {
    if version.as_u64() == Some(VERSION) {
        return Ok(());
    }
    let whole = match version {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match whole {
        Some(v) if v != VERSION => Err(Error::UnsupportedVersion(v)),
        Some(_) => Err(Error::invalid_envelope("'version' must be the integer 1")),
        None => Err(Error::invalid_envelope(format!(
            "'version' must be an unsigned integer, found {}",
            version
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DxDocument {
        let mut f = DxSection::new("f", vec!["repo".into(), "cont".into()]);
        f.push_row(vec!["https://example.com".into(), "none".into()])
            .unwrap();
        let mut b = DocumentBuilder::new();
        b.context("nm", DxValue::from("dx"));
        b.reference("js", "javascript|bun");
        b.section(f);
        b.stack_slot();
        b.build()
    }

    #[test]
    fn test_envelope_round_trip_keeps_stack_position() {
        let doc = sample();
        let json = to_string(&doc).unwrap();
        let back = from_str(&json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.section_order().last(), Some(&SectionSlot::Stack));
    }

    #[test]
    fn test_envelope_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_string(&sample()).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["context"]["nm"]["t"], "s");
        assert_eq!(json["refs"]["js"], "javascript|bun");
        assert_eq!(json["sections"][0]["schema"][1], "cont");
        assert_eq!(json["order"][1]["slot"], "stack");
        assert_eq!(json["order"][0]["id"], "f");
    }

    #[test]
    fn test_missing_order_uses_section_list() {
        let doc = from_str(
            r#"{"version":1,"sections":[{"id":"b","schema":["x"]},{"id":"a","schema":["x"],"rows":[[]]}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = doc.sections().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(doc.section("a").unwrap().rows()[0], vec![DxValue::Null]);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (r#"{"context":{}}"#, "missing"),
            (r#"not json"#, "expected"),
            (r#"{"version":1,"sections":[{"id":"a","schema":["x"]},{"id":"a","schema":["y"]}]}"#, "duplicate"),
            (r#"{"version":1,"sections":[{"id":"a","schema":["x"],"rows":[[{"t":"n","v":1},{"t":"n","v":2}]]}]}"#, "wider"),
            (r#"{"version":1,"order":[{"slot":"section","id":"zz"}]}"#, "unknown section"),
            (r#"{"version":1,"sections":[{"id":"a","schema":["x","x"]}]}"#, "repeats"),
        ];
        for (input, needle) in cases {
            match from_str(input) {
                Err(Error::InvalidEnvelope(msg)) => {
                    assert!(msg.contains(needle), "{:?}: {}", input, msg)
                }
                other => panic!("{:?} gave {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(
            from_str(r#"{"version":3}"#).unwrap_err(),
            Error::UnsupportedVersion(3)
        );
        let mut envelope = to_envelope(&sample());
        envelope.version = 0;
        assert_eq!(from_envelope(envelope).unwrap_err(), Error::UnsupportedVersion(0));
    }

    #[test]
    fn test_version_spellings() {
        let cases = [
            (r#"{"version":2.0}"#, Some(2)),
            (r#"{"version":"2"}"#, Some(2)),
            (r#"{"version":7,"sections":"??"}"#, Some(7)),
            (r#"{"version":1.0}"#, None),
            (r#"{"version":"1"}"#, None),
            (r#"{"version":1.5}"#, None),
            (r#"{"version":-1}"#, None),
            (r#"{"version":null}"#, None),
        ];
        for (input, expected) in cases {
            match (from_str(input), expected) {
                (Err(Error::UnsupportedVersion(v)), Some(want)) => assert_eq!(v, want, "{}", input),
                (Err(Error::InvalidEnvelope(_)), None) => {}
                (other, _) => panic!("{} gave {:?}", input, other),
            }
        }
        assert!(from_str(r#"{"version":1}"#).unwrap().is_empty());
    }

    #[test]
    fn test_floats_keep_every_digit() {
        for n in [946681.0992474564, 0.1 + 0.2, 1e-7, 123456789.12345678] {
            let mut b = DocumentBuilder::new();
            b.context("n", DxValue::Number(n));
            let doc = b.build();
            let back = from_str(&to_string(&doc).unwrap()).unwrap();
            assert_eq!(back.context().get("n"), Some(&DxValue::Number(n)));
            assert_eq!(back, doc);
        }
    }
}

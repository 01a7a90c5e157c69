//! The canonical document model shared by every codec.
//!
//! A [`DxDocument`] holds three things:
//!
//! - **context**: top-level configuration, `key → DxValue`
//! - **refs**: reference definitions, `key → raw text` (pipe-joined, never typed)
//! - **sections**: `id → DxSection` tables, plus an explicit section order
//!
//! Documents are produced wholesale by a parser or by [`DocumentBuilder`] and
//! expose read-only accessors afterwards.
//!
//! ```rust
//! use dx_format::{DocumentBuilder, DxSection, DxValue};
//!
//! let mut forge = DxSection::new("f", vec!["repo".into(), "cont".into()]);
//! forge.push_row(vec![DxValue::from("https://example.com")]).unwrap();
//!
//! let mut builder = DocumentBuilder::new();
//! builder.context("nm", DxValue::from("dx"));
//! builder.section(forge);
//! let doc = builder.build();
//!
//! let forge = doc.section("f").unwrap();
//! assert_eq!(forge.rows()[0], vec![DxValue::from("https://example.com"), DxValue::Null]);
//! ```

use crate::map::OrderedMap;
use crate::{DxValue, Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// One table of a document.
///
/// Every row is exactly `schema.len()` cells long; [`DxSection::push_row`]
/// right-pads shorter rows with [`DxValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct DxSection {
    id: String,
    schema: Vec<String>,
    rows: Vec<Vec<DxValue>>,
}

impl DxSection {
    pub fn new(id: impl Into<String>, schema: Vec<String>) -> Self {
        DxSection {
            id: id.into(),
            schema,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<DxValue>] {
        &self.rows
    }

    /// Position of `key` in the schema.
    #[must_use]
    pub fn column(&self, key: &str) -> Option<usize> {
        self.schema.iter().position(|k| k == key)
    }

    /// Value of `key` in row `row`, if both exist.
    #[must_use]
    pub fn get(&self, row: usize, key: &str) -> Option<&DxValue> {
        let col = self.column(key)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Appends a row, padding it with `Null` up to the schema length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] (with line 0) when the row is wider
    /// than the schema.
    pub fn push_row(&mut self, mut row: Vec<DxValue>) -> Result<()> {
        if row.len() > self.schema.len() {
            return Err(Error::schema_mismatch(0, self.schema.len(), row.len()));
        }
        row.resize(self.schema.len(), DxValue::Null);
        self.rows.push(row);
        Ok(())
    }

    /// Sets `key` in a transposed single-row section.
    ///
    /// A new key extends the schema and the row; an existing key has its value
    /// replaced in place. Returns the replaced value.
    pub(crate) fn set_field(&mut self, key: String, value: DxValue) -> Option<DxValue> {
        debug_assert!(self.rows.len() <= 1, "set_field on a multi-row section");
        if self.rows.is_empty() {
            self.rows.push(vec![DxValue::Null; self.schema.len()]);
        }
        let row = &mut self.rows[0];
        match self.schema.iter().position(|k| *k == key) {
            Some(col) => Some(std::mem::replace(&mut row[col], value)),
            None => {
                self.schema.push(key);
                row.push(value);
                None
            }
        }
    }

    fn is_consistent(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.schema.len())
    }
}

/// An entry of the document's section order.
///
/// `Stack` marks where the reference block (`[stack]` in Human V3) sits
/// relative to the sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionSlot {
    Section(String),
    Stack,
}

/// A section order entry resolved against the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Section(&'a DxSection),
    Stack,
}

/// A parsed DX document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DxDocument {
    context: OrderedMap<DxValue>,
    refs: OrderedMap<String>,
    sections: IndexMap<String, DxSection>,
    order: Vec<SectionSlot>,
}

impl DxDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    #[must_use]
    pub fn context(&self) -> &OrderedMap<DxValue> {
        &self.context
    }

    #[must_use]
    pub fn refs(&self) -> &OrderedMap<String> {
        &self.refs
    }

    #[must_use]
    pub fn section(&self, id: &str) -> Option<&DxSection> {
        self.sections.get(id)
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn section_order(&self) -> &[SectionSlot] {
        &self.order
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.refs.is_empty() && self.sections.is_empty()
    }

    /// Iterates the slots in serialization order.
    ///
    /// Ids listed in the section order come first; any section missing from it
    /// follows in insertion order so no table is ever dropped.
    pub fn slots(&self) -> impl Iterator<Item = Slot<'_>> + '_ {
        let ordered = self.order.iter().filter_map(move |slot| match slot {
            SectionSlot::Section(id) => self.sections.get(id).map(Slot::Section),
            SectionSlot::Stack => Some(Slot::Stack),
        });
        let listed: HashSet<&str> = self
            .order
            .iter()
            .filter_map(|slot| match slot {
                SectionSlot::Section(id) => Some(id.as_str()),
                SectionSlot::Stack => None,
            })
            .collect();
        let unordered = self
            .sections
            .values()
            .filter(move |s| !listed.contains(s.id.as_str()))
            .map(Slot::Section);
        ordered.chain(unordered)
    }

    /// Iterates the sections in serialization order.
    pub fn sections(&self) -> impl Iterator<Item = &DxSection> + '_ {
        self.slots().filter_map(|slot| match slot {
            Slot::Section(section) => Some(section),
            Slot::Stack => None,
        })
    }

    /// Returns a copy where every `Ref(key)` is replaced by `String(refs[key])`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UndefinedReference`] for the first pointer whose key
    /// has no definition.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dx_format::{DocumentBuilder, DxValue};
    ///
    /// let mut builder = DocumentBuilder::new();
    /// builder.reference("A", "Some Value");
    /// builder.context("ds", DxValue::Ref("A".into()));
    /// let doc = builder.build().resolve_refs().unwrap();
    ///
    /// assert_eq!(doc.context().get("ds"), Some(&DxValue::from("Some Value")));
    /// ```
    pub fn resolve_refs(&self) -> Result<DxDocument> {
        let mut resolved = self.clone();
        for value in resolved.context.values_mut() {
            resolve_value(value, &self.refs)?;
        }
        for section in resolved.sections.values_mut() {
            for row in &mut section.rows {
                for value in row.iter_mut() {
                    resolve_value(value, &self.refs)?;
                }
            }
        }
        Ok(resolved)
    }
}

fn resolve_value(value: &mut DxValue, refs: &OrderedMap<String>) -> Result<()> {
    match value {
        DxValue::Ref(key) => {
            let raw = refs
                .get(key)
                .ok_or_else(|| Error::UndefinedReference(key.clone()))?;
            *value = DxValue::String(raw.clone());
        }
        DxValue::Array(items) => {
            for item in items.iter_mut() {
                resolve_value(item, refs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Assembles a [`DxDocument`].
///
/// Sections are recorded in the section order the first time their id is
/// seen; inserting a section with an existing id replaces it in place.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: DxDocument,
}

impl DocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a context entry, returning the previous value for that key.
    pub fn context(&mut self, key: impl Into<String>, value: DxValue) -> Option<DxValue> {
        self.doc.context.insert(key.into(), value)
    }

    /// Sets a raw reference definition, returning the previous text.
    pub fn reference(&mut self, key: impl Into<String>, raw: impl Into<String>) -> Option<String> {
        self.doc.refs.insert(key.into(), raw.into())
    }

    /// Inserts a section, returning the one it replaced.
    pub fn section(&mut self, section: DxSection) -> Option<DxSection> {
        debug_assert!(section.is_consistent(), "row length differs from schema");
        let slot = SectionSlot::Section(section.id.clone());
        if !self.doc.order.contains(&slot) {
            self.doc.order.push(slot);
        }
        self.doc.sections.insert(section.id.clone(), section)
    }

    /// Records the reference block position. Later calls are ignored.
    pub fn stack_slot(&mut self) {
        if !self.doc.order.contains(&SectionSlot::Stack) {
            self.doc.order.push(SectionSlot::Stack);
        }
    }

    /// Appends an explicit order entry ahead of the section it names.
    ///
    /// Returns `false` when the slot is already present.
    pub fn slot(&mut self, slot: SectionSlot) -> bool {
        if self.doc.order.contains(&slot) {
            return false;
        }
        self.doc.order.push(slot);
        true
    }

    pub(crate) fn section_mut(&mut self, id: &str) -> Option<&mut DxSection> {
        self.doc.sections.get_mut(id)
    }

    /// Finishes the document, dropping order entries that name no section.
    #[must_use]
    pub fn build(mut self) -> DxDocument {
        let sections = &self.doc.sections;
        let before = self.doc.order.len();
        self.doc.order.retain(|slot| match slot {
            SectionSlot::Section(id) => sections.contains_key(id),
            SectionSlot::Stack => true,
        });
        if self.doc.order.len() != before {
            debug!(
                dropped = before - self.doc.order.len(),
                "dropped order entries without a section"
            );
        }
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, schema: &[&str]) -> DxSection {
        DxSection::new(id, schema.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_push_row_pads_with_null() {
        let mut s = section("d", &["id", "nm", "ac"]);
        s.push_row(vec![DxValue::from(1)]).unwrap();
        assert_eq!(
            s.rows()[0],
            vec![DxValue::from(1), DxValue::Null, DxValue::Null]
        );
    }

    #[test]
    fn test_push_row_rejects_wide_rows() {
        let mut s = section("d", &["id"]);
        let err = s
            .push_row(vec![DxValue::from(1), DxValue::from(2)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
        assert!(s.rows().is_empty());
    }

    #[test]
    fn test_set_field_replaces_in_place() {
        let mut s = section("f", &[]);
        assert!(s.set_field("repo".into(), DxValue::from("a")).is_none());
        s.set_field("cont".into(), DxValue::from("none"));
        let old = s.set_field("repo".into(), DxValue::from("b"));
        assert_eq!(old, Some(DxValue::from("a")));
        assert_eq!(s.schema(), ["repo", "cont"]);
        assert_eq!(s.get(0, "repo"), Some(&DxValue::from("b")));
    }

    #[test]
    fn test_builder_records_first_seen_order() {
        let mut b = DocumentBuilder::new();
        b.section(section("f", &["a"]));
        b.stack_slot();
        b.section(section("y", &["b"]));
        b.section(section("f", &["c"]));
        b.stack_slot();
        let doc = b.build();

        assert_eq!(
            doc.section_order(),
            [
                SectionSlot::Section("f".into()),
                SectionSlot::Stack,
                SectionSlot::Section("y".into())
            ]
        );
        assert_eq!(doc.section("f").unwrap().schema(), ["c"]);
    }

    #[test]
    fn test_build_drops_dangling_slots() {
        let mut b = DocumentBuilder::new();
        b.slot(SectionSlot::Section("ghost".into()));
        b.section(section("f", &["a"]));
        let doc = b.build();
        assert_eq!(doc.section_order(), [SectionSlot::Section("f".into())]);
    }

    #[test]
    fn test_slots_append_unordered_sections() {
        let mut doc = DxDocument::new();
        doc.sections.insert("a".into(), section("a", &["x"]));
        doc.sections.insert("b".into(), section("b", &["x"]));
        doc.order.push(SectionSlot::Section("b".into()));

        let ids: Vec<_> = doc.sections().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_slots_visit_each_section_once() {
        let mut doc = DxDocument::new();
        for i in 0..500 {
            let id = format!("s{}", i);
            doc.sections.insert(id.clone(), section(&id, &["x"]));
            if i % 2 == 1 {
                doc.order.push(SectionSlot::Section(id));
            }
        }
        doc.order.insert(0, SectionSlot::Stack);

        let slots: Vec<_> = doc.slots().collect();
        assert_eq!(slots.len(), 501);
        assert!(matches!(slots[0], Slot::Stack));
        let ids: Vec<&str> = doc.sections().map(DxSection::id).collect();
        assert_eq!(ids[0], "s1");
        assert_eq!(ids[249], "s499");
        assert_eq!(ids[250], "s0");
        assert_eq!(ids[499], "s498");
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 500);
    }

    #[test]
    fn test_resolve_refs_walks_arrays() {
        let mut s = section("d", &["tg"]);
        s.push_row(vec![DxValue::Array(vec![
            DxValue::Ref("A".into()),
            DxValue::from("plain"),
        ])])
        .unwrap();
        let mut b = DocumentBuilder::new();
        b.reference("A", "resolved");
        b.section(s);
        let doc = b.build().resolve_refs().unwrap();

        assert_eq!(
            doc.section("d").unwrap().rows()[0][0],
            DxValue::Array(vec![DxValue::from("resolved"), DxValue::from("plain")])
        );
    }

    #[test]
    fn test_resolve_refs_reports_missing_key() {
        let mut b = DocumentBuilder::new();
        b.context("x", DxValue::Ref("nope".into()));
        let err = b.build().resolve_refs().unwrap_err();
        assert_eq!(err, Error::UndefinedReference("nope".into()));
    }

    #[test]
    fn test_documents_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DxDocument>();
    }
}

//! Human V3 output.

use super::parse::{open_quote, split_items};
use crate::abbrev::{expand_key, expand_section};
use crate::document::{DxDocument, DxSection, Slot, SectionSlot};
use crate::options::HumanOptions;
use crate::value::{format_number, parse_number};
use crate::DxValue;

/// Reports whether a string must be quoted to read back as the same string.
///
/// # Examples
///
/// ```rust
/// use dx_format::human::needs_quotes;
///
/// assert!(needs_quotes("hello world"));
/// assert!(needs_quotes(""));
/// assert!(needs_quotes("3.14"));
/// assert!(needs_quotes("false"));
/// assert!(needs_quotes("^js"));
/// assert!(needs_quotes("it's"));
/// assert!(!needs_quotes("https://example.com"));
/// assert!(!needs_quotes("none"));
/// ```
#[must_use]
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(char::is_whitespace)
        || matches!(s, "true" | "false" | "-" | "~")
        || s.starts_with(['^', '"', '\''])
        || s.contains(" | ")
        || parse_number(s).is_some()
        || s.parse::<f64>().is_ok()
        || open_quote(s).is_some()
}

/// Reports whether `s` wrapped in `quote` reads back as one string.
fn quotes_cleanly(s: &str, quote: char) -> bool {
    let quoted = format!("{quote}{s}{quote}");
    split_items(&quoted).len() == 1 && open_quote(&quoted).is_none()
}

/// Prefers the quote `s` does not contain. A string that neither quote can
/// hold falls back to the preferred one and does not read back.
fn write_string(out: &mut String, s: &str) {
    if !needs_quotes(s) {
        out.push_str(s);
        return;
    }
    let preferred = if s.contains('"') { ['\'', '"'] } else { ['"', '\''] };
    let quote = preferred
        .into_iter()
        .find(|&q| quotes_cleanly(s, q))
        .unwrap_or(preferred[0]);
    out.push(quote);
    out.push_str(s);
    out.push(quote);
}

/// Keys end at the first `=` and must not read as a header or a comment.
fn key_needs_quotes(key: &str) -> bool {
    key.is_empty()
        || key.chars().any(char::is_whitespace)
        || key.contains(['=', '"', '\''])
        || key.starts_with(['[', '#'])
}

fn write_key(out: &mut String, key: &str) {
    if key_needs_quotes(key) {
        let quote = if key.contains('"') { '\'' } else { '"' };
        out.push(quote);
        out.push_str(key);
        out.push(quote);
    } else {
        out.push_str(key);
    }
}

pub(crate) fn write_value(out: &mut String, value: &DxValue) {
    match value {
        DxValue::String(s) => write_string(out, s),
        DxValue::Number(n) => out.push_str(&format_number(*n)),
        DxValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        DxValue::Null => out.push('-'),
        DxValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                write_value(out, item);
            }
        }
        DxValue::Ref(key) => {
            out.push('^');
            out.push_str(key);
        }
    }
}

/// Writes the first cell of a table row, which takes the place of the key.
fn write_row_key(out: &mut String, value: &DxValue) {
    match value {
        DxValue::String(s) => write_key(out, s),
        other => write_value(out, other),
    }
}

pub(crate) struct HumanFormatter<'a> {
    output: String,
    options: &'a HumanOptions,
}

impl<'a> HumanFormatter<'a> {
    pub(crate) fn new(options: &'a HumanOptions) -> Self {
        HumanFormatter {
            output: String::with_capacity(256),
            options,
        }
    }

    pub(crate) fn into_inner(self) -> String {
        self.output
    }

    fn key(&self, key: &str) -> String {
        if self.options.expand_keys {
            expand_key(key)
        } else {
            key.to_string()
        }
    }

    fn section_name(&self, id: &str) -> String {
        if self.options.expand_sections {
            expand_section(id)
        } else {
            id.to_string()
        }
    }

    fn begin_block(&mut self) {
        if !self.output.is_empty() && self.options.blank_line_between_sections {
            self.output.push('\n');
        }
    }

    pub(crate) fn write_document(&mut self, doc: &DxDocument) {
        if !doc.context().is_empty() {
            for (key, value) in doc.context() {
                let key = self.key(key);
                self.write_pair(&key, value);
            }
        }

        let has_sentinel = doc.section_order().contains(&SectionSlot::Stack);
        if !has_sentinel && !doc.refs().is_empty() {
            self.write_stack(doc);
        }

        for slot in doc.slots() {
            match slot {
                Slot::Stack => self.write_stack(doc),
                Slot::Section(section) => self.write_section(section),
            }
        }
    }

    fn write_pair(&mut self, key: &str, value: &DxValue) {
        write_key(&mut self.output, key);
        self.output.push_str(" = ");
        write_value(&mut self.output, value);
        self.output.push('\n');
    }

    fn write_stack(&mut self, doc: &DxDocument) {
        self.begin_block();
        self.output.push_str("[stack]\n");
        for (key, raw) in doc.refs() {
            write_key(&mut self.output, key);
            self.output.push_str(" = ");
            for (i, item) in raw.split('|').enumerate() {
                if i > 0 {
                    self.output.push_str(" | ");
                }
                self.output.push_str(item.trim());
            }
            self.output.push('\n');
        }
    }

    fn write_section(&mut self, section: &DxSection) {
        self.begin_block();
        let name = self.section_name(section.id());
        self.output.push('[');
        self.output.push_str(&name);
        self.output.push(']');

        if let [row] = section.rows() {
            self.output.push('\n');
            for (key, value) in section.schema().iter().zip(row) {
                let key = self.key(key);
                self.write_pair(&key, value);
            }
            return;
        }

        if section.schema().is_empty() {
            self.output.push('\n');
            return;
        }

        self.output.push_str(" = ");
        let columns: Vec<String> = section.schema().iter().map(|c| self.key(c)).collect();
        self.output.push_str(&columns.join(" | "));
        self.output.push('\n');

        for row in section.rows() {
            let Some((first, cells)) = row.split_first() else {
                continue;
            };
            write_row_key(&mut self.output, first);
            self.output.push_str(" =");
            for (i, cell) in cells.iter().enumerate() {
                self.output.push_str(if i == 0 { " " } else { " | " });
                write_value(&mut self.output, cell);
            }
            self.output.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentBuilder;

    fn format(doc: &DxDocument) -> String {
        let options = HumanOptions::default();
        let mut formatter = HumanFormatter::new(&options);
        formatter.write_document(doc);
        formatter.into_inner()
    }

    fn value(v: &DxValue) -> String {
        let mut out = String::new();
        write_value(&mut out, v);
        out
    }

    #[test]
    fn test_quote_choice() {
        assert_eq!(value(&DxValue::from("hello world")), "\"hello world\"");
        assert_eq!(value(&DxValue::from("say \"hi\"")), "'say \"hi\"'");
        assert_eq!(value(&DxValue::from("")), "\"\"");
        assert_eq!(value(&DxValue::from("-")), "\"-\"");
        assert_eq!(value(&DxValue::from("1e5")), "\"1e5\"");
        assert_eq!(value(&DxValue::from("plain")), "plain");
    }

    #[test]
    fn test_quote_choice_reads_back() {
        let cases = [
            ("it's | \"x\"", "\"it's | \"x\"\""),
            ("it's", "\"it's\""),
            ("a \"b\" | c's", "\"a \"b\" | c's\""),
            ("x\" y", "'x\" y'"),
        ];
        for (input, expected) in cases {
            let written = value(&DxValue::from(input));
            assert_eq!(written, expected, "{:?}", input);
            assert_eq!(crate::human::parse_value(&written), DxValue::from(input));
        }
    }

    #[test]
    fn test_keys_quote_like_row_keys() {
        let mut b = DocumentBuilder::new();
        b.context("#x", DxValue::from(1));
        b.context("a=b", DxValue::from(2));
        b.reference("[k", "v");
        let doc = b.build();
        assert_eq!(
            format(&doc),
            "\"#x\" = 1\n\"a=b\" = 2\n\n[stack]\n\"[k\" = v\n"
        );
    }

    #[test]
    fn test_arrays_quote_items() {
        let v = DxValue::Array(vec![
            DxValue::from("a b"),
            DxValue::Null,
            DxValue::from(2),
            DxValue::Ref("k".into()),
        ]);
        assert_eq!(value(&v), "\"a b\" | - | 2 | ^k");
    }

    #[test]
    fn test_stack_goes_first_without_sentinel() {
        let mut b = DocumentBuilder::new();
        b.context("nm", DxValue::from("dx"));
        b.reference("js", "javascript|bun");
        let doc = b.build();
        assert_eq!(format(&doc), "name = dx\n\n[stack]\njs = javascript | bun\n");
    }

    #[test]
    fn test_table_layout() {
        let mut s = DxSection::new("d", vec!["id".into(), "nm".into()]);
        s.push_row(vec![DxValue::from("a"), DxValue::from("x y")]).unwrap();
        s.push_row(vec![DxValue::from("b c")]).unwrap();
        let mut b = DocumentBuilder::new();
        b.section(s);
        assert_eq!(
            format(&b.build()),
            "[driven] = id | name\na = \"x y\"\n\"b c\" = -\n"
        );
    }

    #[test]
    fn test_empty_table_keeps_columns() {
        let mut b = DocumentBuilder::new();
        b.section(DxSection::new("x", vec!["nm".into()]));
        b.section(DxSection::new("q", vec![]));
        assert_eq!(format(&b.build()), "[dependencies] = name\n\n[q]\n");
    }

    #[test]
    fn test_compact_and_short_names() {
        let mut s = DxSection::new("f", vec!["repo".into()]);
        s.push_row(vec![DxValue::from("r")]).unwrap();
        let mut b = DocumentBuilder::new();
        b.context("nm", DxValue::from("dx"));
        b.section(s);
        let doc = b.build();

        let options = HumanOptions::compact()
            .with_expand_keys(false)
            .with_expand_sections(false);
        let mut formatter = HumanFormatter::new(&options);
        formatter.write_document(&doc);
        assert_eq!(formatter.into_inner(), "nm = dx\n[f]\nrepo = r\n");
    }
}

//! Line state machine for Human V3 input.

use crate::abbrev::{compress_key, compress_section};
use crate::document::{DocumentBuilder, DxDocument, DxSection, SectionSlot};
use crate::value::parse_number;
use crate::{DxValue, Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Where the parser stands between two lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Before any header: pairs belong to the context.
    TopLevelConfig,
    /// Inside `[stack]`: pairs are reference definitions.
    InStackSection,
    /// Inside `[name]`, or `[name] = Col | Col` when `table` is set.
    InFlatSection { id: String, table: bool },
    /// Inside `[parent.child]`; `parent` is the parent's section id.
    InNestedSubsection { parent: String, child: String },
}

enum Header<'a> {
    Stack,
    Flat {
        name: &'a str,
        columns: Option<Vec<&'a str>>,
    },
    Nested {
        parent: &'a str,
        child: &'a str,
    },
}

struct Line<'a> {
    number: usize,
    text: &'a str,
    indent: usize,
}

impl Line<'_> {
    /// 1-based column of a byte offset into the trimmed text.
    fn col(&self, offset: usize) -> usize {
        self.indent + self.text[..offset].chars().count() + 1
    }
}

struct Pair<'a> {
    key: &'a str,
    value: &'a str,
}

pub(crate) struct HumanParser<'a> {
    input: &'a str,
    builder: DocumentBuilder,
    state: State,
    /// Section id → the name that claimed it, for collision warnings.
    names: HashMap<String, String>,
    /// Parent id → folded `child_key` fields, in first-seen order.
    folds: IndexMap<String, IndexMap<String, DxValue>>,
}

impl<'a> HumanParser<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        HumanParser {
            input,
            builder: DocumentBuilder::new(),
            state: State::TopLevelConfig,
            names: HashMap::new(),
            folds: IndexMap::new(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<DxDocument> {
        let input = self.input;
        for (idx, raw) in input.lines().enumerate() {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let line = Line {
                number: idx + 1,
                text,
                indent: raw.chars().count() - raw.trim_start().chars().count(),
            };

            if text.starts_with('[') {
                let header = parse_header(&line)?;
                self.enter(header, &line);
            } else {
                let pair = split_pair(&line)?;
                self.accept(pair, &line)?;
            }
        }

        self.fold_nested();
        let doc = self.builder.build();
        debug!(
            context = doc.context().len(),
            refs = doc.refs().len(),
            sections = doc.section_count(),
            "parsed human document"
        );
        Ok(doc)
    }

    fn claim_id(&mut self, name: &str, line: usize) -> String {
        let id = compress_section(name);
        if let Some(previous) = self.names.get(&id) {
            if previous != name {
                warn!(
                    id = %id,
                    first = %previous,
                    second = name,
                    line,
                    "section names share an id, the later section wins"
                );
            }
        }
        self.names.insert(id.clone(), name.to_string());
        id
    }

    fn enter(&mut self, header: Header<'_>, line: &Line<'_>) {
        self.state = match header {
            Header::Stack => {
                self.builder.stack_slot();
                State::InStackSection
            }
            Header::Flat { name, columns } => {
                let id = self.claim_id(name, line.number);
                let table = columns.is_some();
                let schema = columns
                    .unwrap_or_default()
                    .into_iter()
                    .map(compress_key)
                    .collect();
                if self.builder.section(DxSection::new(id.clone(), schema)).is_some() {
                    warn!(section = name, line = line.number, "section redefined, dropping earlier fields");
                }
                State::InFlatSection { id, table }
            }
            Header::Nested { parent, child } => {
                let id = self.claim_id(parent, line.number);
                self.builder.slot(SectionSlot::Section(id.clone()));
                self.folds.entry(id.clone()).or_default();
                State::InNestedSubsection {
                    parent: id,
                    child: child.to_string(),
                }
            }
        };
    }

    fn accept(&mut self, pair: Pair<'_>, line: &Line<'_>) -> Result<()> {
        match &self.state {
            State::TopLevelConfig => {
                let key = compress_key(pair.key);
                if self.builder.context(key.clone(), parse_value(pair.value)).is_some() {
                    warn!(key = %key, line = line.number, "duplicate context key, keeping the later value");
                }
            }
            State::InStackSection => {
                let raw = pair
                    .value
                    .split('|')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join("|");
                if self.builder.reference(pair.key, raw).is_some() {
                    warn!(key = pair.key, line = line.number, "duplicate reference, keeping the later value");
                }
            }
            State::InFlatSection { id, table: false } => {
                if let Some(section) = self.builder.section_mut(id) {
                    let key = compress_key(pair.key);
                    if section.set_field(key.clone(), parse_value(pair.value)).is_some() {
                        warn!(key = %key, line = line.number, "duplicate key, keeping the later value");
                    }
                }
            }
            State::InFlatSection { id, table: true } => {
                if let Some(section) = self.builder.section_mut(id) {
                    let mut row = vec![DxValue::String(pair.key.to_string())];
                    if !pair.value.is_empty() {
                        row.extend(split_items(pair.value).into_iter().map(parse_value));
                    }
                    section.push_row(row).map_err(|e| e.at_line(line.number))?;
                }
            }
            State::InNestedSubsection { parent, child } => {
                let key = if pair.key.contains('-') {
                    pair.key.to_string()
                } else {
                    compress_key(&format!("{}_{}", child, pair.key))
                };
                let fields = self.folds.entry(parent.clone()).or_default();
                if fields.insert(key.clone(), parse_value(pair.value)).is_some() {
                    warn!(key = %key, line = line.number, "duplicate nested key, keeping the later value");
                }
            }
        }
        Ok(())
    }

    /// Folds every `[parent.child]` block into its parent section.
    ///
    /// A single-row section already holding the parent id absorbs the fields;
    /// a table under that id is replaced.
    fn fold_nested(&mut self) {
        for (id, fields) in std::mem::take(&mut self.folds) {
            if let Some(section) = self.builder.section_mut(&id) {
                if section.rows().len() <= 1 {
                    for (key, value) in fields {
                        section.set_field(key, value);
                    }
                    continue;
                }
                warn!(id = %id, "nested blocks replace a table with the same id");
            }
            let mut section = DxSection::new(id, Vec::new());
            for (key, value) in fields {
                section.set_field(key, value);
            }
            self.builder.section(section);
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn parse_header<'a>(line: &Line<'a>) -> Result<Header<'a>> {
    let text = line.text;
    let bad = |offset: usize, msg: &str, hint: &str| {
        Error::malformed_header(line.number, line.col(offset), msg, Some(hint))
    };

    let close = text
        .find(']')
        .ok_or_else(|| bad(0, "unclosed section header", "add a closing ']' after the section name"))?;
    let name = &text[1..close];
    if name.is_empty() {
        return Err(bad(0, "empty section name", "write a name between '[' and ']'"));
    }
    if let Some((offset, c)) = name.char_indices().find(|&(_, c)| !is_name_char(c)) {
        return Err(bad(
            1 + offset,
            &format!("illegal character '{}' in section name", c),
            "section names may only contain letters, digits, '_' and '.'",
        ));
    }

    let rest = text[close + 1..].trim();
    let columns = if rest.is_empty() {
        None
    } else if let Some(list) = rest.strip_prefix('=') {
        let columns: Vec<&str> = list.split('|').map(str::trim).collect();
        if columns.iter().any(|c| c.is_empty()) {
            return Err(bad(
                close + 1,
                "empty column name",
                "list the columns as '[name] = Col | Col'",
            ));
        }
        let mut seen: Vec<String> = Vec::with_capacity(columns.len());
        for column in &columns {
            let key = compress_key(column);
            if seen.contains(&key) {
                return Err(bad(
                    close + 1,
                    &format!("duplicate column '{}'", column),
                    "each column may appear only once",
                ));
            }
            seen.push(key);
        }
        Some(columns)
    } else {
        return Err(bad(
            close + 1,
            "unexpected text after ']'",
            "start a table with '[name] = Col | Col' or move the text to its own line",
        ));
    };

    if name == "stack" {
        if columns.is_some() {
            return Err(bad(close + 1, "[stack] takes no column list", "remove the text after ']'"));
        }
        return Ok(Header::Stack);
    }

    if let Some((parent, child)) = name.split_once('.') {
        if parent.is_empty() || child.is_empty() || child.contains('.') {
            return Err(bad(1, "malformed nested section name", "nested sections are written '[parent.child]'"));
        }
        if parent == "stack" {
            return Err(bad(1, "[stack] cannot have subsections", "define references directly under '[stack]'"));
        }
        if columns.is_some() {
            return Err(bad(close + 1, "nested sections take no column list", "remove the text after ']'"));
        }
        return Ok(Header::Nested { parent, child });
    }

    Ok(Header::Flat { name, columns })
}

/// Splits `key = value`. A key opening with a quote runs to the matching
/// quote, so it may contain `=`; the returned key has its quotes removed.
fn split_pair<'a>(line: &Line<'a>) -> Result<Pair<'a>> {
    let text = line.text;
    let key_end = match text.as_bytes().first() {
        Some(&q) if q == b'"' || q == b'\'' => match text[1..].find(char::from(q)) {
            Some(close) => close + 2,
            None => {
                return Err(Error::malformed_key_value(
                    line.number,
                    line.col(0),
                    &format!("unclosed {} quote in key", quote_name(q)),
                    Some("add a closing quote after the key"),
                ))
            }
        },
        _ => 0,
    };
    let eq = text[key_end..].find('=').map(|i| key_end + i).ok_or_else(|| {
        Error::malformed_key_value(
            line.number,
            line.col(0),
            "expected key = value or section header",
            Some("write 'key = value', or open a section with '[name]'"),
        )
    })?;

    let raw_key = text[..eq].trim();
    if raw_key.is_empty() {
        return Err(Error::malformed_key_value(
            line.number,
            line.col(eq),
            "empty key before '='",
            Some("write a key name before '='"),
        ));
    }
    let key = unquote(raw_key).unwrap_or(raw_key);

    let after = &text[eq + 1..];
    let value = after.trim();
    let value_start = eq + 1 + (after.len() - after.trim_start().len());
    if let Some((offset, quote)) = open_quote(value) {
        return Err(Error::malformed_key_value(
            line.number,
            line.col(value_start + offset),
            &format!("unclosed {} quote", quote_name(quote)),
            Some(&format!("add a closing {} to the value", char::from(quote))),
        ));
    }

    Ok(Pair { key, value })
}

fn quote_name(quote: u8) -> &'static str {
    if quote == b'"' {
        "double"
    } else {
        "single"
    }
}

/// Byte offset and kind of a quote still open at the end of `text`, scanning
/// the way [`split_items`] does.
pub(crate) fn open_quote(text: &str) -> Option<(usize, u8)> {
    let mut open: Option<(usize, u8)> = None;
    for (i, b) in text.bytes().enumerate() {
        match open {
            Some((_, q)) if b == q => open = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => open = Some((i, b)),
            None => {}
        }
    }
    open
}

/// Strips one matching pair of surrounding quotes.
fn unquote(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last))
            if bytes.len() >= 2 && first == last && (first == b'"' || first == b'\'') =>
        {
            Some(&text[1..text.len() - 1])
        }
        _ => None,
    }
}

/// Splits on ` | ` outside quotes, trimming every item.
pub(crate) fn split_items(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if bytes[i..].starts_with(b" | ") => {
                items.push(text[start..i].trim());
                i += 3;
                start = i;
                continue;
            }
            None => {}
        }
        i += 1;
    }
    items.push(text[start..].trim());
    items
}

pub(crate) fn parse_value(text: &str) -> DxValue {
    let text = text.trim();
    match text {
        "-" | "~" => return DxValue::Null,
        "true" => return DxValue::Bool(true),
        "false" => return DxValue::Bool(false),
        _ => {}
    }

    let items = split_items(text);
    if items.len() >= 2 {
        return DxValue::Array(items.into_iter().map(parse_value).collect());
    }
    if let Some(inner) = unquote(text) {
        return DxValue::String(inner.to_string());
    }
    if let Some(n) = parse_number(text) {
        return DxValue::Number(n);
    }
    match text.strip_prefix('^') {
        Some(key) if !key.is_empty() => DxValue::Ref(key.to_string()),
        _ => DxValue::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<DxDocument> {
        HumanParser::new(input).parse()
    }

    #[test]
    fn test_split_items_respects_quotes() {
        assert_eq!(split_items("a | b | c"), vec!["a", "b", "c"]);
        assert_eq!(split_items("\"a | b\" | c"), vec!["\"a | b\"", "c"]);
        assert_eq!(split_items("a|b"), vec!["a|b"]);
        assert_eq!(split_items(""), vec![""]);
    }

    #[test]
    fn test_parse_value_rule_order() {
        assert_eq!(parse_value("~"), DxValue::Null);
        assert_eq!(parse_value("true"), DxValue::Bool(true));
        assert_eq!(parse_value("\"true\""), DxValue::from("true"));
        assert_eq!(parse_value("'18'"), DxValue::from("18"));
        assert_eq!(parse_value("18"), DxValue::from(18));
        assert_eq!(parse_value("18.2.0"), DxValue::from("18.2.0"));
        assert_eq!(parse_value("^js"), DxValue::Ref("js".into()));
        assert_eq!(parse_value("^"), DxValue::from("^"));
        assert_eq!(
            parse_value("- | ~ | x"),
            DxValue::Array(vec![DxValue::Null, DxValue::Null, DxValue::from("x")])
        );
    }

    #[test]
    fn test_states_route_pairs() {
        let doc = parse(
            "name = dx\n[stack]\njs = a | b\n[forge]\nrepository = r\n[js.dependencies]\nreact = 18\n",
        )
        .unwrap();
        assert_eq!(doc.context().get("nm"), Some(&DxValue::from("dx")));
        assert_eq!(doc.refs().get("js").map(String::as_str), Some("a|b"));
        assert_eq!(doc.section("f").unwrap().schema(), ["repo"]);
        assert_eq!(doc.section("j").unwrap().schema(), ["dependencies_react"]);
        assert_eq!(
            doc.section_order(),
            [
                SectionSlot::Stack,
                SectionSlot::Section("f".into()),
                SectionSlot::Section("j".into())
            ]
        );
    }

    #[test]
    fn test_table_rows() {
        let doc = parse("[driven] = id | name | active\nalpha = x | true\n\"beta gamma\" =\n").unwrap();
        let d = doc.section("d").unwrap();
        assert_eq!(d.schema(), ["id", "nm", "ac"]);
        assert_eq!(
            d.rows(),
            [
                vec![DxValue::from("alpha"), DxValue::from("x"), DxValue::Bool(true)],
                vec![DxValue::from("beta gamma"), DxValue::Null, DxValue::Null],
            ]
        );
    }

    #[test]
    fn test_table_row_too_wide() {
        let err = parse("[d] = a | b\nk = 1 | 2").unwrap_err();
        assert_eq!(
            err,
            Error::SchemaMismatch {
                line: 2,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_nested_merges_into_flat_parent() {
        let doc = parse("[js.dependencies]\nreact = 18\n\n[js]\nname = app\n").unwrap();
        let j = doc.section("j").unwrap();
        assert_eq!(j.schema(), ["nm", "dependencies_react"]);
        assert_eq!(j.rows().len(), 1);
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let doc = parse("[forge]\nrepository = a\ncontainer = b\nrepository = c\n").unwrap();
        let f = doc.section("f").unwrap();
        assert_eq!(f.schema(), ["repo", "cont"]);
        assert_eq!(f.rows()[0][0], DxValue::from("c"));
    }

    #[test]
    fn test_colliding_names_keep_later_section() {
        let doc = parse("[fruit]\na = 1\n[forge]\nb = 2\n").unwrap();
        assert_eq!(doc.section_count(), 1);
        assert_eq!(doc.section("f").unwrap().schema(), ["b"]);
    }

    #[test]
    fn test_header_errors_carry_position() {
        let cases = [
            ("[forge", 1),
            ("  [for ge]", 7),
            ("[]", 1),
            ("[forge] junk", 8),
            ("[a..b]", 2),
            ("[stack] = a", 8),
            ("[a.b] = c", 6),
        ];
        for (input, col) in cases {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, Error::MalformedHeader { line: 1, .. }),
                "{:?} gave {:?}",
                input,
                err
            );
            assert_eq!(err.column(), col, "{:?}", input);
            assert!(err.hint().is_some());
        }
    }

    #[test]
    fn test_key_value_errors_carry_position() {
        let err = parse("name dx").unwrap_err();
        assert_eq!(err.column(), 1);
        assert_eq!(err.message(), "expected key = value or section header");

        let err = parse("\n   = x").unwrap_err();
        assert_eq!((err.line(), err.column()), (2, 4));

        let err = parse("name = \"open").unwrap_err();
        assert_eq!((err.line(), err.column()), (1, 8));
        assert!(err.message().contains("double"));
    }

    #[test]
    fn test_quoted_keys_may_hold_equals() {
        let doc = parse("[driven] = id | name\n\"a=b\" = x\n'c \"d\"' = y\n").unwrap();
        let d = doc.section("d").unwrap();
        assert_eq!(d.rows()[0], vec![DxValue::from("a=b"), DxValue::from("x")]);
        assert_eq!(d.rows()[1], vec![DxValue::from("c \"d\""), DxValue::from("y")]);

        let doc = parse("\"#x\" = 1\n\"[y\" = 2\n[stack]\n\"k=v\" = a | b\n").unwrap();
        assert_eq!(doc.context().get("#x"), Some(&DxValue::from(1)));
        assert_eq!(doc.context().get("[y"), Some(&DxValue::from(2)));
        assert_eq!(doc.refs().get("k=v").map(String::as_str), Some("a|b"));

        let err = parse("\"a = 1").unwrap_err();
        assert_eq!((err.line(), err.column()), (1, 1));
        assert!(err.message().contains("key"));
    }

    #[test]
    fn test_open_quote_follows_item_scan() {
        assert_eq!(open_quote("\"it's | \"x\"\""), None);
        assert_eq!(open_quote("'a\"b'"), None);
        assert_eq!(open_quote("it's"), Some((2, b'\'')));
        assert_eq!(open_quote("a | \"b"), Some((4, b'"')));

        let doc = parse("note = \"it's | \"x\"\"\n").unwrap();
        assert_eq!(doc.context().get("nt"), Some(&DxValue::from("it's | \"x\"")));

        let err = parse("name = a | 'b").unwrap_err();
        assert_eq!((err.line(), err.column()), (1, 12));
        assert!(err.message().contains("single"));
    }
}

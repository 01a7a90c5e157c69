//! Abbreviation dictionaries for field keys and section names.
//!
//! The LLM format stores short tokens (`nm`, `repo`, `f`); the Human V3 format
//! shows full names (`name`, `repository`, `forge`). Both tables are static,
//! indexed once on first use and shared read-only by every parser and
//! serializer.
//!
//! Lookups never fail:
//!
//! - an unknown key passes through unchanged in both directions
//! - a key containing `-` (package or module names) is never touched
//! - an unknown section name becomes its lowercased first character
//! - an unknown section id expands to itself
//!
//! ```rust
//! use dx_format::abbrev::{compress_key, expand_key, compress_section, expand_section};
//!
//! assert_eq!(compress_key("repository"), "repo");
//! assert_eq!(expand_key("nm"), "name");
//! assert_eq!(compress_key("left-pad"), "left-pad");
//! assert_eq!(compress_key("my_custom_key"), "my_custom_key");
//!
//! assert_eq!(compress_section("forge"), "f");
//! assert_eq!(expand_section("f"), "forge");
//! assert_eq!(compress_section("Workers"), "w");
//! ```

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Field keys as `(full name, abbreviation)`.
///
/// No abbreviation is the full name of a different entry, so compress and
/// expand are inverses on the whole table.
static KEY_TABLE: &[(&str, &str)] = &[
    // identity
    ("id", "id"),
    ("name", "nm"),
    ("title", "tt"),
    ("description", "ds"),
    ("label", "lb"),
    ("alias", "al"),
    // state
    ("status", "st"),
    ("active", "ac"),
    ("enabled", "en"),
    ("visible", "vs"),
    ("locked", "lk"),
    ("archived", "ar"),
    ("deleted", "dl"),
    ("completed", "cp"),
    ("pending", "pn"),
    // timestamps
    ("created", "cr"),
    ("updated", "up"),
    ("date", "dt"),
    ("time", "tm"),
    ("timestamp", "ts"),
    ("expires", "ex"),
    ("duration", "du"),
    ("year", "yr"),
    ("month", "mo"),
    ("day", "dy"),
    // metrics
    ("count", "ct"),
    ("total", "tl"),
    ("amount", "am"),
    ("price", "pr"),
    ("quantity", "qt"),
    ("rating", "rt"),
    ("score", "sc"),
    ("rank", "rk"),
    ("percent", "pct"),
    ("average", "avg"),
    ("minimum", "min"),
    ("maximum", "max"),
    // dimensions
    ("width", "wd"),
    ("height", "ht"),
    ("size", "sz"),
    ("length", "len"),
    ("depth", "dp"),
    ("weight", "wt"),
    // web
    ("url", "ur"),
    ("path", "pt"),
    ("link", "lnk"),
    ("source", "src"),
    ("destination", "dst"),
    ("reference", "ref"),
    ("domain", "dom"),
    // contact
    ("email", "em"),
    ("phone", "ph"),
    ("address", "ad"),
    ("first_name", "fn"),
    ("last_name", "lnm"),
    ("company", "cmp"),
    // location
    ("city", "cy"),
    ("country", "co"),
    ("region", "rg"),
    ("zipcode", "zp"),
    ("latitude", "la"),
    ("longitude", "lo"),
    ("location", "loc"),
    // visual
    ("color", "cl"),
    ("background", "bg"),
    ("foreground", "fg"),
    ("image", "im"),
    ("icon", "ic"),
    ("thumbnail", "th"),
    // relations
    ("parent", "pa"),
    ("children", "ch"),
    ("user", "us"),
    ("owner", "ow"),
    ("author", "au"),
    ("editor", "ed"),
    ("reviewer", "rv"),
    ("assignee", "asg"),
    ("member", "mb"),
    ("group", "gp"),
    ("team", "tea"),
    ("organization", "org"),
    // classification
    ("category", "ca"),
    ("tags", "tg"),
    ("type", "tp"),
    ("value", "vl"),
    ("key", "ky"),
    ("mode", "md"),
    ("level", "lv"),
    ("priority", "pri"),
    ("version", "v"),
    // project and workspace
    ("workspace", "ws"),
    ("repository", "repo"),
    ("container", "cont"),
    ("ci_cd", "ci"),
    ("editors", "eds"),
    // commerce
    ("sku", "sk"),
    ("customer", "cu"),
    ("shipping", "sh"),
    ("order", "ord"),
    ("invoice", "inv"),
    ("product", "prd"),
    ("discount", "dsc"),
    ("tax", "tx"),
    // content
    ("text", "txt"),
    ("message", "msg"),
    ("comment", "cmt"),
    ("note", "nt"),
    ("summary", "sum"),
    ("content", "cnt"),
    ("body", "bd"),
    ("header", "hd"),
    ("footer", "ft"),
];

/// Section names as `(full name, id)`.
///
/// `stack` is absent on purpose: `[stack]` is a reserved header holding
/// reference definitions and never becomes a section.
static SECTION_TABLE: &[(&str, &str)] = &[
    ("config", "c"),
    ("forge", "f"),
    ("style", "y"),
    ("ui", "u"),
    ("media", "m"),
    ("i18n", "i"),
    ("icon", "o"),
    ("font", "t"),
    ("driven", "d"),
    ("generator", "g"),
    ("scripts", "s"),
    ("dependencies", "x"),
    ("js", "j"),
    ("python", "p"),
    ("rust", "r"),
];

struct Dictionary {
    compress: HashMap<&'static str, &'static str>,
    expand: HashMap<&'static str, &'static str>,
}

impl Dictionary {
    fn index(table: &'static [(&'static str, &'static str)]) -> Self {
        let mut compress = HashMap::with_capacity(table.len());
        let mut expand = HashMap::with_capacity(table.len());
        for &(full, short) in table {
            compress.insert(full, short);
            expand.insert(short, full);
        }
        Dictionary { compress, expand }
    }
}

static KEYS: Lazy<Dictionary> = Lazy::new(|| Dictionary::index(KEY_TABLE));
static SECTIONS: Lazy<Dictionary> = Lazy::new(|| Dictionary::index(SECTION_TABLE));

#[inline]
fn is_opaque(key: &str) -> bool {
    key.contains('-')
}

/// Compresses a full field key to its abbreviation.
#[must_use]
pub fn compress_key(full: &str) -> String {
    if is_opaque(full) {
        return full.to_string();
    }
    KEYS.compress
        .get(full)
        .map_or_else(|| full.to_string(), |s| (*s).to_string())
}

/// Expands an abbreviated field key to its full name.
#[must_use]
pub fn expand_key(token: &str) -> String {
    if is_opaque(token) {
        return token.to_string();
    }
    KEYS.expand
        .get(token)
        .map_or_else(|| token.to_string(), |s| (*s).to_string())
}

/// Maps a full section name to its id.
///
/// Unknown names fall back to their lowercased first character. Two different
/// unknown names sharing an initial therefore share an id; the Human V3 parser
/// warns when that happens within one document.
#[must_use]
pub fn compress_section(full: &str) -> String {
    if let Some(id) = SECTIONS.compress.get(full) {
        return (*id).to_string();
    }
    full.chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_default()
}

/// Maps a section id to its full name, or returns the id unchanged.
#[must_use]
pub fn expand_section(id: &str) -> String {
    SECTIONS
        .expand
        .get(id)
        .map_or_else(|| id.to_string(), |s| (*s).to_string())
}

#[must_use]
pub fn is_known_key(full: &str) -> bool {
    KEYS.compress.contains_key(full)
}

#[must_use]
pub fn is_known_abbreviation(token: &str) -> bool {
    KEYS.expand.contains_key(token)
}

#[must_use]
pub fn is_known_section(full: &str) -> bool {
    SECTIONS.compress.contains_key(full)
}

#[must_use]
pub fn is_known_section_id(id: &str) -> bool {
    SECTIONS.expand.contains_key(id)
}

/// Iterates the field table as `(full name, abbreviation)` pairs.
pub fn key_entries() -> impl Iterator<Item = (&'static str, &'static str)> {
    KEY_TABLE.iter().copied()
}

/// Iterates the section table as `(full name, id)` pairs.
pub fn section_entries() -> impl Iterator<Item = (&'static str, &'static str)> {
    SECTION_TABLE.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_table_is_a_bijection() {
        let fulls: HashSet<_> = KEY_TABLE.iter().map(|(f, _)| *f).collect();
        let shorts: HashSet<_> = KEY_TABLE.iter().map(|(_, s)| *s).collect();
        assert_eq!(fulls.len(), KEY_TABLE.len(), "duplicate full name");
        assert_eq!(shorts.len(), KEY_TABLE.len(), "duplicate abbreviation");

        for &(full, short) in KEY_TABLE {
            if short != full {
                assert!(
                    !fulls.contains(short),
                    "abbreviation {} is also a full name",
                    short
                );
            }
            assert!(!full.contains('-') && !short.contains('-'));
        }
    }

    #[test]
    fn test_section_table_is_a_bijection() {
        let fulls: HashSet<_> = SECTION_TABLE.iter().map(|(f, _)| *f).collect();
        let ids: HashSet<_> = SECTION_TABLE.iter().map(|(_, s)| *s).collect();
        assert_eq!(fulls.len(), SECTION_TABLE.len());
        assert_eq!(ids.len(), SECTION_TABLE.len());
        assert!(!fulls.contains("stack"));
    }

    #[test]
    fn test_compress_and_expand_known_keys() {
        assert_eq!(compress_key("name"), "nm");
        assert_eq!(compress_key("version"), "v");
        assert_eq!(compress_key("repository"), "repo");
        assert_eq!(compress_key("container"), "cont");
        assert_eq!(expand_key("v"), "version");
        assert_eq!(expand_key("ci"), "ci_cd");
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        for key in ["xyz", "unknown_key", "", "dependencies_react", "NM"] {
            assert_eq!(compress_key(key), key);
            assert_eq!(expand_key(key), key);
        }
    }

    #[test]
    fn test_hyphenated_keys_are_opaque() {
        assert_eq!(compress_key("left-pad"), "left-pad");
        assert_eq!(expand_key("left-pad"), "left-pad");
        assert_eq!(compress_key("dependencies_left-pad"), "dependencies_left-pad");
    }

    #[test]
    fn test_section_fallback_uses_first_letter() {
        assert_eq!(compress_section("forge"), "f");
        assert_eq!(compress_section("workers"), "w");
        assert_eq!(compress_section("Zones"), "z");
        assert_eq!(compress_section(""), "");
        assert_eq!(expand_section("w"), "w");
        assert_eq!(expand_section("f"), "forge");
    }

    #[test]
    fn test_lookups_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (compress_key("name"), expand_section("i"))))
            .collect();
        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                ("nm".to_string(), "i18n".to_string())
            );
        }
    }
}

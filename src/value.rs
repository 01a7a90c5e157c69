//! The DX value model.
//!
//! [`DxValue`] is the single primitive shared by every codec. It is a closed
//! sum type: strings, numbers, booleans, null, arrays and named references.
//!
//! ## Creating Values
//!
//! ```rust
//! use dx_format::{dx, DxValue};
//!
//! let text = DxValue::from("hello");
//! let number = DxValue::from(42);
//! let list = dx!(["react", 18, true]);
//! let pointer = DxValue::Ref("js".to_string());
//!
//! assert!(text.is_string());
//! assert_eq!(number.as_f64(), Some(42.0));
//! assert_eq!(list.as_array().map(Vec::len), Some(3));
//! assert_eq!(pointer.as_ref_key(), Some("js"));
//! ```
//!
//! ## Machine Representation
//!
//! With serde, each value is written as a tagged pair `{"t": tag, "v": payload}`
//! where the tag is one of `s`, `n`, `b`, `x`, `a`, `r`:
//!
//! ```rust
//! use dx_format::DxValue;
//!
//! let json = serde_json::to_string(&DxValue::Bool(true)).unwrap();
//! assert_eq!(json, r#"{"t":"b","v":true}"#);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed DX value.
///
/// `Array` is the only variant that carries children and may nest arbitrarily.
/// `Ref` names an entry of the document's reference table; resolving it is up
/// to the caller (see [`DxDocument::resolve_refs`](crate::DxDocument::resolve_refs)).
#[derive(Clone, Debug, PartialEq, Default)]
pub enum DxValue {
    String(String),
    Number(f64),
    Bool(bool),
    #[default]
    Null,
    Array(Vec<DxValue>),
    Ref(String),
}

impl DxValue {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, DxValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, DxValue::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, DxValue::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, DxValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, DxValue::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_ref(&self) -> bool {
        matches!(self, DxValue::Ref(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dx_format::DxValue;
    ///
    /// assert_eq!(DxValue::Bool(true).as_bool(), Some(true));
    /// assert_eq!(DxValue::from(42).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DxValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// References are not strings; use [`DxValue::as_ref_key`] for those.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DxValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DxValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<DxValue>> {
        match self {
            DxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// If the value is a reference pointer, returns the referenced key.
    #[inline]
    #[must_use]
    pub fn as_ref_key(&self) -> Option<&str> {
        match self {
            DxValue::Ref(key) => Some(key),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages and the machine tag table.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            DxValue::String(_) => "string",
            DxValue::Number(_) => "number",
            DxValue::Bool(_) => "bool",
            DxValue::Null => "null",
            DxValue::Array(_) => "array",
            DxValue::Ref(_) => "ref",
        }
    }
}

/// Parses `s` as a canonical integer or decimal: `-?(0|[1-9][0-9]*)(\.[0-9]+)?`.
///
/// Only this shape decodes as a number. `1e5`, `007`, `.5`, `inf` and `0.0.1`
/// stay strings, so text like version numbers and zip codes survives untouched.
///
/// # Examples
///
/// ```rust
/// use dx_format::value::parse_number;
///
/// assert_eq!(parse_number("42"), Some(42.0));
/// assert_eq!(parse_number("-3.25"), Some(-3.25));
/// assert_eq!(parse_number("0.0.1"), None);
/// assert_eq!(parse_number("007"), None);
/// ```
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    if bytes.first() == Some(&b'-') {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_len = pos - int_start;
    if int_len == 0 || (int_len > 1 && bytes[int_start] == b'0') {
        return None;
    }

    if pos < bytes.len() {
        if bytes[pos] != b'.' {
            return None;
        }
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == frac_start || pos != bytes.len() {
            return None;
        }
    }

    s.parse::<f64>().ok()
}

/// Writes a number the way every text codec does.
///
/// Rust's `Display` for `f64` is the shortest representation that parses back
/// to the same bits and never uses exponent notation, so the output is always
/// accepted by [`parse_number`] for finite input.
#[must_use]
pub fn format_number(n: f64) -> String {
    n.to_string()
}

impl fmt::Display for DxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DxValue::String(s) => write!(f, "{}", s),
            DxValue::Number(n) => write!(f, "{}", format_number(*n)),
            DxValue::Bool(b) => write!(f, "{}", b),
            DxValue::Null => write!(f, "-"),
            DxValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            DxValue::Ref(key) => write!(f, "^{}", key),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "t", content = "v")]
enum TaggedRef<'a> {
    #[serde(rename = "s")]
    String(&'a str),
    #[serde(rename = "n")]
    Number(f64),
    #[serde(rename = "b")]
    Bool(bool),
    #[serde(rename = "x")]
    Null(()),
    #[serde(rename = "a")]
    Array(&'a [DxValue]),
    #[serde(rename = "r")]
    Ref(&'a str),
}

#[derive(Deserialize)]
#[serde(tag = "t", content = "v")]
enum Tagged {
    #[serde(rename = "s")]
    String(String),
    #[serde(rename = "n")]
    Number(f64),
    #[serde(rename = "b")]
    Bool(bool),
    #[serde(rename = "x")]
    Null(()),
    #[serde(rename = "a")]
    Array(Vec<DxValue>),
    #[serde(rename = "r")]
    Ref(String),
}

impl Serialize for DxValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tagged = match self {
            DxValue::String(s) => TaggedRef::String(s),
            DxValue::Number(n) => TaggedRef::Number(*n),
            DxValue::Bool(b) => TaggedRef::Bool(*b),
            DxValue::Null => TaggedRef::Null(()),
            DxValue::Array(items) => TaggedRef::Array(items),
            DxValue::Ref(key) => TaggedRef::Ref(key),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DxValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::String(s) => DxValue::String(s),
            Tagged::Number(n) => DxValue::Number(n),
            Tagged::Bool(b) => DxValue::Bool(b),
            Tagged::Null(()) => DxValue::Null,
            Tagged::Array(items) => DxValue::Array(items),
            Tagged::Ref(key) => DxValue::Ref(key),
        })
    }
}

impl TryFrom<DxValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: DxValue) -> crate::Result<Self> {
        match value {
            DxValue::Number(n) => Ok(n),
            other => Err(crate::Error::custom(format!(
                "expected number, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<DxValue> for bool {
    type Error = crate::Error;

    fn try_from(value: DxValue) -> crate::Result<Self> {
        match value {
            DxValue::Bool(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected bool, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<DxValue> for String {
    type Error = crate::Error;

    fn try_from(value: DxValue) -> crate::Result<Self> {
        match value {
            DxValue::String(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for DxValue {
    fn from(value: bool) -> Self {
        DxValue::Bool(value)
    }
}

impl From<i32> for DxValue {
    fn from(value: i32) -> Self {
        DxValue::Number(value as f64)
    }
}

impl From<i64> for DxValue {
    fn from(value: i64) -> Self {
        DxValue::Number(value as f64)
    }
}

impl From<u32> for DxValue {
    fn from(value: u32) -> Self {
        DxValue::Number(value as f64)
    }
}

impl From<f64> for DxValue {
    fn from(value: f64) -> Self {
        DxValue::Number(value)
    }
}

impl From<&str> for DxValue {
    fn from(value: &str) -> Self {
        DxValue::String(value.to_string())
    }
}

impl From<String> for DxValue {
    fn from(value: String) -> Self {
        DxValue::String(value)
    }
}

impl<T: Into<DxValue>> From<Vec<T>> for DxValue {
    fn from(value: Vec<T>) -> Self {
        DxValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DxValue>> From<Option<T>> for DxValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DxValue::Null, Into::into)
    }
}

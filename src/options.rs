//! Configuration options for DX serialization.
//!
//! This module provides types to customize codec output:
//!
//! - [`HumanOptions`]: layout of the Human V3 formatter
//! - [`LlmOptions`]: extra compaction for the LLM serializer
//! - [`AutoRefs`]: thresholds for hoisting repeated strings into references
//!
//! Parsers take no options; every accepted input has exactly one meaning.
//!
//! ## Examples
//!
//! ```rust
//! use dx_format::{HumanOptions, LlmOptions, AutoRefs};
//!
//! // Keep the short tokens in the editable view
//! let options = HumanOptions::new().with_expand_keys(false);
//! assert!(!options.expand_keys);
//!
//! // Hoist strings of 8+ chars that appear at least twice
//! let options = LlmOptions::new().with_auto_refs(AutoRefs::new(8, 2));
//! assert!(options.auto_refs.is_some());
//! ```

/// Options for the Human V3 formatter.
///
/// # Examples
///
/// ```rust
/// use dx_format::HumanOptions;
///
/// let options = HumanOptions::new();
/// assert!(options.expand_keys);
/// assert!(options.expand_sections);
/// assert!(options.blank_line_between_sections);
///
/// let options = HumanOptions::compact();
/// assert!(!options.blank_line_between_sections);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HumanOptions {
    /// Write full key names (`name`) instead of tokens (`nm`).
    pub expand_keys: bool,
    /// Write full section names (`[forge]`) instead of ids (`[f]`).
    pub expand_sections: bool,
    /// Separate blocks with an empty line.
    pub blank_line_between_sections: bool,
}

impl Default for HumanOptions {
    fn default() -> Self {
        HumanOptions {
            expand_keys: true,
            expand_sections: true,
            blank_line_between_sections: true,
        }
    }
}

impl HumanOptions {
    /// Creates default options (expanded names, blank line between sections).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that drop the blank separator lines.
    #[must_use]
    pub fn compact() -> Self {
        HumanOptions {
            blank_line_between_sections: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_expand_keys(mut self, expand: bool) -> Self {
        self.expand_keys = expand;
        self
    }

    #[must_use]
    pub fn with_expand_sections(mut self, expand: bool) -> Self {
        self.expand_sections = expand;
        self
    }

    #[must_use]
    pub fn with_blank_line_between_sections(mut self, blank: bool) -> Self {
        self.blank_line_between_sections = blank;
        self
    }
}

/// Thresholds for automatic reference generation.
///
/// A string is hoisted into the reference table when it is at least
/// `min_length` characters long and occurs at least `min_count` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoRefs {
    pub min_length: usize,
    pub min_count: usize,
}

impl AutoRefs {
    #[must_use]
    pub const fn new(min_length: usize, min_count: usize) -> Self {
        AutoRefs {
            min_length,
            min_count,
        }
    }
}

impl Default for AutoRefs {
    fn default() -> Self {
        AutoRefs::new(8, 2)
    }
}

/// Options for the LLM serializer.
///
/// With the defaults, `llm::to_string_with_options` is identical to
/// `llm::to_string`. Auto refs change the value types a parser sees (strings
/// become `Ref`s), so they are opt-in.
///
/// # Examples
///
/// ```rust
/// use dx_format::{LlmOptions, AutoRefs};
///
/// let options = LlmOptions::new();
/// assert!(options.auto_refs.is_none());
///
/// let options = LlmOptions::new().with_auto_refs(AutoRefs::default());
/// assert_eq!(options.auto_refs, Some(AutoRefs { min_length: 8, min_count: 2 }));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LlmOptions {
    pub auto_refs: Option<AutoRefs>,
}

impl LlmOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables reference hoisting with the given thresholds.
    #[must_use]
    pub fn with_auto_refs(mut self, auto_refs: AutoRefs) -> Self {
        self.auto_refs = Some(auto_refs);
        self
    }
}

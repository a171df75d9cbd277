//! Public result types: what callers get back from [`crate::parse`].

use indexmap::IndexMap;

use crate::attrs::AttrValue;
use crate::error::Diagnostic;

/// A `(tag, attrs)` pair attached to a range of output text or, for
/// self-closing tags, a single zero-width point. Immutable once emitted;
/// attribute insertion order is preserved and duplicate keys within one tag
/// keep the first occurrence's position with the last occurrence's value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    pub tag: String,
    pub attrs: IndexMap<String, AttrValue>,
}

impl Annotation {
    pub(crate) fn new(tag: impl Into<String>, attrs: IndexMap<String, AttrValue>) -> Self {
        Self {
            tag: tag.into(),
            attrs,
        }
    }
}

/// A maximal run of output text whose every character is covered by exactly
/// the same set of (non-marker) annotations. `annotations` preserves
/// emission order and is not deduplicated: a tag that opens twice covering
/// the same run appears twice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub text: String,
    pub annotations: Vec<Annotation>,
}

/// A zero-width annotation at one output position, produced by a
/// self-closing tag (or by a recovery that resolved to an empty span).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Char index into [`ParseResult::text`].
    pub pos: usize,
    pub annotation: Annotation,
}

/// The result of parsing one input string: the plain-text rendering, its
/// segmentation into constant-annotation runs, and the zero-width markers
/// between them. Concatenating every segment's `text` reproduces `text`
/// exactly; `markers` is sorted by `pos` ascending, stably.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseResult {
    pub text: String,
    pub segments: Vec<Segment>,
    pub markers: Vec<Marker>,
    /// Non-fatal anomalies recovered from during parsing. Always present
    /// (possibly empty); never affects `text`, `segments`, or `markers`.
    pub diagnostics: Vec<Diagnostic>,
}

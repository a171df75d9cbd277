//! Non-fatal diagnostics. Parsing never fails on input, but callers who want
//! visibility into the recovery decisions the engine made can inspect
//! [`crate::ParseResult::diagnostics`].

/// One recovered anomaly observed while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Position where the anomaly was found, in units that vary by `kind`:
    /// `UnterminatedTag`, `NotATagLiteralLt`, and `UnclosedAttributeQuote`
    /// are lexer-phase and use a byte offset into the *input*; `StrayClose`
    /// is engine-phase and uses a char offset into the *output* text
    /// produced so far. Diagnostics are for debugging, not text addressing —
    /// unlike `Span`/`Marker` positions, this is not a load-bearing invariant.
    pub pos: usize,
    pub kind: DiagnosticKind,
}

/// What kind of anomaly was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A `</name>` with no matching open tag on the stack; silently dropped.
    StrayClose,
    /// A tag began validly (`<name`) but the input ended before a `>`.
    UnterminatedTag,
    /// A `<` could not begin a valid tag name or `/` and was emitted literally.
    NotATagLiteralLt,
    /// An attribute's quoted value never found its closing quote.
    UnclosedAttributeQuote,
}

//! *kindaxml* is a forgiving, non-standards-compliant inline-markup parser
//! for text sprinkled with tags like `<cite id=1>...</cite>`.
//!
//! # Example
//! ```rust
//! use kindaxml::ParserConfig;
//!
//! let result = kindaxml::parse(
//!     "We shipped <cite id=1>last week</cite>.",
//!     Some(&ParserConfig::default_cite_config()),
//! );
//! println!("{}", result.text);
//! for segment in &result.segments {
//!     println!("{:?}", segment);
//! }
//! ```
//!
//! # Why would I need this?
//! Text written by people for people is full of tags that were never
//! going to validate: left unclosed, closed out of order, or typo'd past
//! recognition. A strict parser rejects the whole document over one
//! mistake; this one decides, tag by tag, what a reasonable reader would
//! have meant and keeps going. Each recognized tag has its own
//! [`RecoveryStrategy`] for what happens when its closing tag never shows
//! up: fall back to the rest of the line, to the next whitespace-delimited
//! word, to the next tag, or just give up on it quietly.
//!
//! If you're looking for a strict, standards-compliant markup parser, this
//! crate is the wrong tool; reach for `quick-xml` or similar instead.
//!
//! # Note
//! This only understands the tiny tag grammar described in [`ParserConfig`]
//! and [`AttrValue`] — no namespaces, no entities, no DTDs. It isn't trying
//! to be XML, just something that looks enough like it.

mod attrs;
mod config;
mod cursor;
mod engine;
mod error;
mod lexer;
mod materializer;
mod model;

pub use attrs::AttrValue;
pub use config::{ConfigError, ParserConfig, RecoveryStrategy, UnknownMode};
pub use error::{Diagnostic, DiagnosticKind};
pub use model::{Annotation, Marker, ParseResult, Segment};

/// Parses `input`, applying `config`'s recognized-tag set and recovery
/// policy. Passing `None` uses [`ParserConfig::default_cite_config`].
///
/// Never fails: every malformed tag is resolved by some recovery strategy
/// (possibly `drop`), and anomalies worth knowing about are recorded in
/// [`ParseResult::diagnostics`] rather than surfaced as an error.
pub fn parse(input: &str, config: Option<&ParserConfig>) -> ParseResult {
    let owned;
    let config = match config {
        Some(cfg) => cfg,
        None => {
            owned = ParserConfig::default_cite_config();
            &owned
        }
    };
    materializer::materialize(engine::run(input, config))
}

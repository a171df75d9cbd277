//! Attribute micro-parser: the content between a tag's name and its closing
//! `>` or `/>`, split into an ordered `key -> value` mapping.
//!
//! Tolerant by design: a key with no `=` is a boolean-present attribute, an
//! unquoted value runs to the next whitespace, and an unclosed quote runs to
//! the end of the tag's content instead of failing the parse.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{Diagnostic, DiagnosticKind};

/// The value carried by a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    /// A bare key with no `=value` part, e.g. `<todo done>`.
    Boolean,
    /// A `key=value`, `key='value'`, or `key="value"` attribute. Quotes are
    /// stripped; the value is otherwise raw (no entity decoding).
    String(String),
}

impl AttrValue {
    /// `true` for [`AttrValue::Boolean`].
    pub fn is_boolean(&self) -> bool {
        matches!(self, AttrValue::Boolean)
    }

    /// The string value, if this is [`AttrValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            AttrValue::Boolean => None,
        }
    }
}

fn is_key_start(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_key_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// Parses the attribute list inside a tag's angle brackets. `content` is the
/// tag's inner text with the name, the leading `/` (for close tags) and the
/// trailing `/` (for self-closing tags) already stripped by the lexer.
///
/// Diagnostics for unclosed quotes are appended to `diagnostics`, offset by
/// `base_pos` (the byte position of `content`'s start in the original input).
pub(crate) fn parse_attrs(
    content: &str,
    base_pos: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<String, AttrValue> {
    let mut attrs = IndexMap::new();
    let mut cur = Cursor::new(content);

    loop {
        skip_whitespace(&mut cur);
        if cur.eof() {
            break;
        }

        let key_start = cur.byte_pos();
        while let Some(ch) = cur.peek_char() {
            if (cur.byte_pos() == key_start && is_key_start(ch))
                || (cur.byte_pos() != key_start && is_key_continue(ch))
            {
                cur.bump();
            } else {
                break;
            }
        }
        if cur.byte_pos() == key_start {
            // Not a valid key-start character (stray punctuation); skip it
            // and keep scanning rather than looping forever or failing.
            cur.bump();
            continue;
        }
        let key = &content[key_start..cur.byte_pos()];

        skip_whitespace(&mut cur);
        if cur.peek_char() == Some('=') {
            cur.bump();
            skip_whitespace(&mut cur);
            let value = read_value(&mut cur, content, base_pos, diagnostics);
            attrs.insert(key.to_string(), AttrValue::String(value));
        } else {
            attrs.insert(key.to_string(), AttrValue::Boolean);
        }
    }

    attrs
}

fn skip_whitespace(cur: &mut Cursor<'_>) {
    while matches!(cur.peek_char(), Some(ch) if ch.is_whitespace()) {
        cur.bump();
    }
}

fn read_value(
    cur: &mut Cursor<'_>,
    content: &str,
    base_pos: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    match cur.peek_char() {
        Some(q @ ('\'' | '"')) => {
            let quote_byte = q as u8;
            cur.bump(); // past the opening quote
            let value_start = cur.byte_pos();
            match cur.find(quote_byte) {
                Some(len) => {
                    let value = content[value_start..value_start + len].to_string();
                    cur.advance_bytes(len + 1); // past the closing quote
                    value
                }
                None => {
                    // Unclosed quote: recover by taking the rest of the content.
                    diagnostics.push(Diagnostic {
                        pos: base_pos + value_start,
                        kind: DiagnosticKind::UnclosedAttributeQuote,
                    });
                    let value = content[value_start..].to_string();
                    cur.advance_bytes(content.len() - value_start);
                    value
                }
            }
        }
        _ => {
            let value_start = cur.byte_pos();
            while let Some(ch) = cur.peek_char() {
                if ch.is_whitespace() || ch == '/' {
                    break;
                }
                cur.bump();
            }
            content[value_start..cur.byte_pos()].to_string()
        }
    }
}

//! Tolerant tag lexer: turns the input into a stream of [`Token`]s.
//!
//! Uses `memchr` to jump straight to the next structural byte (`<`, `>`),
//! then falls back to a literal `<` whenever what follows can't start a
//! valid tag name.

use indexmap::IndexMap;

use crate::attrs::{parse_attrs, AttrValue};
use crate::cursor::Cursor;
use crate::error::{Diagnostic, DiagnosticKind};

#[derive(Debug)]
pub(crate) enum Token<'a> {
    TextRun(&'a str),
    Open {
        name: &'a str,
        attrs: IndexMap<String, AttrValue>,
        /// The tag's exact original source, `<` through `>` inclusive.
        /// Passthrough mode re-emits this verbatim rather than reconstructing
        /// from the parsed `attrs`, so quoting style and whitespace survive.
        raw: &'a str,
    },
    Close {
        name: &'a str,
        raw: &'a str,
    },
    SelfClose {
        name: &'a str,
        attrs: IndexMap<String, AttrValue>,
        raw: &'a str,
    },
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

enum TagLexResult<'a> {
    Token(Token<'a>),
    /// The `<` didn't begin a valid tag; the cursor has been rewound to
    /// right after it so the caller can emit it as literal text.
    NotATag,
    /// A tag began validly but never terminated before EOF; it (and
    /// everything after it) was discarded. The caller should keep looping.
    Discarded,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: Cursor::new(input),
        }
    }

    pub(crate) fn next_token(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Option<Token<'a>> {
        loop {
            if self.cursor.eof() {
                return None;
            }
            match self.cursor.find(b'<') {
                Some(0) => match self.try_lex_tag(diagnostics) {
                    TagLexResult::Token(tok) => return Some(tok),
                    TagLexResult::NotATag => {
                        let start = self.cursor.byte_pos();
                        self.cursor.bump(); // consume the '<' itself
                        diagnostics.push(Diagnostic {
                            pos: start,
                            kind: DiagnosticKind::NotATagLiteralLt,
                        });
                        return Some(Token::TextRun(&self.input[start..start + 1]));
                    }
                    TagLexResult::Discarded => continue,
                },
                Some(n) => {
                    let start = self.cursor.byte_pos();
                    self.cursor.advance_bytes(n);
                    return Some(Token::TextRun(&self.input[start..start + n]));
                }
                None => {
                    let start = self.cursor.byte_pos();
                    let rest = self.cursor.rest();
                    self.cursor.advance_bytes(rest.len());
                    return if rest.is_empty() {
                        None
                    } else {
                        Some(Token::TextRun(&self.input[start..start + rest.len()]))
                    };
                }
            }
        }
    }

    /// Called with the cursor positioned exactly on `<`.
    fn try_lex_tag(&mut self, diagnostics: &mut Vec<Diagnostic>) -> TagLexResult<'a> {
        let mark = self.cursor.mark();
        self.cursor.bump(); // '<'

        let is_close = self.cursor.peek_char() == Some('/');
        if is_close {
            self.cursor.bump();
        }

        let name_start = self.cursor.byte_pos();
        match self.cursor.peek_char() {
            Some(ch) if is_name_start(ch) => {
                self.cursor.bump();
            }
            _ => {
                self.cursor.rewind(mark);
                return TagLexResult::NotATag;
            }
        }
        while let Some(ch) = self.cursor.peek_char() {
            if is_name_continue(ch) {
                self.cursor.bump();
            } else {
                break;
            }
        }
        let name_end = self.cursor.byte_pos();
        let name = &self.input[name_start..name_end];

        let gt_offset = match self.cursor.find(b'>') {
            Some(n) => n,
            None => {
                diagnostics.push(Diagnostic {
                    pos: mark.byte_pos(),
                    kind: DiagnosticKind::UnterminatedTag,
                });
                let rest_len = self.cursor.rest().len();
                self.cursor.advance_bytes(rest_len);
                return TagLexResult::Discarded;
            }
        };
        let inner_end = self.cursor.byte_pos() + gt_offset;
        let raw_rest = &self.input[name_end..inner_end];
        self.cursor.advance_bytes(gt_offset + 1); // past '>'
        let raw = &self.input[mark.byte_pos()..self.cursor.byte_pos()];

        if is_close {
            // Close tags carry no attributes per the formal grammar; any
            // trailing junk (including a stray `/`) is tolerated and ignored.
            return TagLexResult::Token(Token::Close { name, raw });
        }

        let trimmed = raw_rest.trim_end();
        let (attrs_raw, is_self_close) = match trimmed.strip_suffix('/') {
            Some(stripped) => (stripped, true),
            None => (raw_rest, false),
        };
        let attrs = parse_attrs(attrs_raw, name_end, diagnostics);

        TagLexResult::Token(if is_self_close {
            Token::SelfClose { name, attrs, raw }
        } else {
            Token::Open { name, attrs, raw }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<String> {
        let mut diags = Vec::new();
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token(&mut diags) {
            out.push(match tok {
                Token::TextRun(t) => format!("Text({t:?})"),
                Token::Open { name, .. } => format!("Open({name})"),
                Token::Close { name, .. } => format!("Close({name})"),
                Token::SelfClose { name, .. } => format!("SelfClose({name})"),
            });
        }
        out
    }

    #[test]
    fn basic_open_text_close() {
        assert_eq!(
            tokens("<cite id=1>last week</cite>"),
            vec!["Open(cite)", "Text(\"last week\")", "Close(cite)"]
        );
    }

    #[test]
    fn self_closing_tag() {
        assert_eq!(tokens("<todo id=3/>now"), vec!["SelfClose(todo)", "Text(\"now\")"]);
    }

    #[test]
    fn self_closing_tag_with_space() {
        assert_eq!(tokens("<todo />x"), vec!["SelfClose(todo)", "Text(\"x\")"]);
    }

    #[test]
    fn stray_angle_bracket_is_literal() {
        assert_eq!(tokens("1 < 2"), vec!["Text(\"1 \")", "Text(\"<\")", "Text(\" 2\")"]);
    }

    #[test]
    fn stray_angle_bracket_is_diagnosed() {
        let mut diags = Vec::new();
        let mut lexer = Lexer::new("1 < 2");
        while lexer.next_token(&mut diags).is_some() {}
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::NotATagLiteralLt);
        assert_eq!(diags[0].pos, 2);
    }

    #[test]
    fn empty_close_tag_is_literal() {
        // `</>` never finds a valid name-start, so the `<` falls back to literal text.
        assert_eq!(
            tokens("a</>b"),
            vec!["Text(\"a\")", "Text(\"<\")", "Text(\"/>b\")"]
        );
    }

    #[test]
    fn unterminated_tag_is_discarded() {
        let mut diags = Vec::new();
        let mut lexer = Lexer::new("hello <cite id=1");
        assert!(matches!(lexer.next_token(&mut diags), Some(Token::TextRun("hello "))));
        assert_eq!(lexer.next_token(&mut diags), None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnterminatedTag);
    }

    #[test]
    fn raw_captures_exact_original_source() {
        let mut diags = Vec::new();
        let mut lexer = Lexer::new(r#"<weird a='1' b="2">"#);
        match lexer.next_token(&mut diags) {
            Some(Token::Open { raw, .. }) => assert_eq!(raw, r#"<weird a='1' b="2">"#),
            other => panic!("expected Open token, got {other:?}"),
        }
    }

    #[test]
    fn raw_captures_self_closing_tag_with_unquoted_attr() {
        let mut diags = Vec::new();
        let mut lexer = Lexer::new("<todo id=3/>");
        match lexer.next_token(&mut diags) {
            Some(Token::SelfClose { raw, .. }) => assert_eq!(raw, "<todo id=3/>"),
            other => panic!("expected SelfClose token, got {other:?}"),
        }
    }
}

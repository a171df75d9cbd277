//! The annotation engine: the pending-tag state machine that consumes the
//! lexer's token stream, maintains the stack of open annotations, and
//! applies each tag's recovery strategy when it needs to be resolved
//! without an explicit matching close.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::attrs::AttrValue;
use crate::config::{ParserConfig, RecoveryStrategy, UnknownMode};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::lexer::{Lexer, Token};
use crate::model::{Annotation, Marker};

/// An internal half-open range over output char positions, paired with the
/// annotation it carries. Never has `start == end` — those are promoted to
/// `Marker`s at the moment of emission, per the data model's note that a
/// zero-width span is a marker.
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) annotation: Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForwardState {
    /// Not tracking a forward token (either the strategy isn't
    /// `forward_next_token`, or whitespace hasn't ended yet).
    Idle,
    /// Armed, waiting for the first non-whitespace character of the token.
    AwaitingToken,
    /// Consuming the token; `start` is where it began.
    ConsumingToken { start: usize },
}

struct PendingOpen {
    name: String,
    attrs: IndexMap<String, AttrValue>,
    start: usize,
    line_start: usize,
    strategy: RecoveryStrategy,
    forward_state: ForwardState,
}

pub(crate) struct RunOutput {
    pub(crate) text: String,
    /// Total char length of `text`, carried alongside it so the
    /// materializer doesn't need to recount.
    pub(crate) len: usize,
    pub(crate) spans: Vec<Span>,
    pub(crate) markers: Vec<Marker>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

struct Engine<'cfg> {
    config: &'cfg ParserConfig,
    output: String,
    output_len: usize,
    line_start: usize,
    stack: Vec<PendingOpen>,
    spans: Vec<Span>,
    markers: Vec<Marker>,
    diagnostics: Vec<Diagnostic>,
}

impl<'cfg> Engine<'cfg> {
    fn new(config: &'cfg ParserConfig) -> Self {
        Self {
            config,
            output: String::new(),
            output_len: 0,
            line_start: 0,
            stack: Vec::new(),
            spans: Vec::new(),
            markers: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn emit_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance_forward_states(ch);
            self.output.push(ch);
            self.output_len += 1;
            if ch == '\n' {
                self.line_start = self.output_len;
            }
        }
    }

    /// Advances every pending `forward_next_token` state machine one
    /// character, recovering any that complete. Called before the
    /// character is appended, since a completing token ends *before* the
    /// whitespace that terminates it.
    fn advance_forward_states(&mut self, next_ch: char) {
        let mut finished = Vec::new();
        for (i, pending) in self.stack.iter_mut().enumerate() {
            match pending.forward_state {
                ForwardState::Idle => {}
                ForwardState::AwaitingToken => {
                    if !next_ch.is_whitespace() {
                        pending.forward_state = ForwardState::ConsumingToken {
                            start: self.output_len,
                        };
                    }
                }
                ForwardState::ConsumingToken { .. } => {
                    if next_ch.is_whitespace() {
                        finished.push(i);
                    }
                }
            }
        }
        for i in finished.into_iter().rev() {
            let pending = self.stack.remove(i);
            let trigger = self.output_len;
            self.recover(pending, trigger);
        }
    }

    fn emit_span_or_marker(&mut self, start: usize, end: usize, annotation: Annotation) {
        if start >= end {
            self.markers.push(Marker {
                pos: start,
                annotation,
            });
        } else {
            self.spans.push(Span {
                start,
                end,
                annotation,
            });
        }
    }

    /// Resolves one pending open per its configured recovery strategy. Used
    /// at EOF, for entries popped above a matched close, and for the
    /// auto-close sweep triggered by a new tag event.
    fn recover(&mut self, pending: PendingOpen, trigger_pos: usize) {
        let PendingOpen {
            name,
            attrs,
            start,
            line_start,
            strategy,
            forward_state,
        } = pending;
        trace!(target: "kindaxml::engine", "recovering <{name}> via {strategy}");
        match strategy {
            RecoveryStrategy::ClosedSpan | RecoveryStrategy::Drop => {
                // `closed_span` has no recovery behavior beyond an explicit
                // matching close, which never reaches this function; both
                // cases simply drop the pending annotation.
            }
            RecoveryStrategy::RetroLine => {
                self.emit_span_or_marker(line_start, start, Annotation::new(name, attrs));
            }
            RecoveryStrategy::ForwardNextToken => match forward_state {
                ForwardState::Idle | ForwardState::AwaitingToken => {
                    self.emit_span_or_marker(start, start, Annotation::new(name, attrs));
                }
                ForwardState::ConsumingToken { start: token_start } => {
                    self.emit_span_or_marker(token_start, trigger_pos, Annotation::new(name, attrs));
                }
            },
            RecoveryStrategy::ForwardUntilTag => {
                self.emit_span_or_marker(start, trigger_pos, Annotation::new(name, attrs));
            }
        }
    }

    /// Recovers the topmost pending opens that a *new tag event* (open,
    /// close, or self-close) resolves: any `forward_until_tag` entry
    /// unconditionally, and (open events only) a `retro_line` entry if the
    /// triggering tag is on the same output line it opened on. spec.md §4.5
    /// only documents the retro_line auto-close trigger under `OpenTag`; a
    /// self-close must not sweep it, or an explicit matching close later in
    /// the input finds nothing left on the stack.
    fn sweep_top_for_new_tag_event(&mut self, is_open_event: bool) {
        loop {
            let should_pop = match self.stack.last() {
                None => false,
                Some(top) => match top.strategy {
                    RecoveryStrategy::ForwardUntilTag => true,
                    RecoveryStrategy::RetroLine => is_open_event && top.line_start == self.line_start,
                    _ => false,
                },
            };
            if !should_pop {
                break;
            }
            let pending = self.stack.pop().expect("checked Some above");
            let trigger = self.output_len;
            self.recover(pending, trigger);
        }
    }

    fn handle_open(&mut self, name: &str, attrs: IndexMap<String, AttrValue>, raw: &str) {
        self.sweep_top_for_new_tag_event(true);
        if self.config.is_recognized(name) {
            let strategy = self.config.recovery_for(name);
            let forward_state = if strategy == RecoveryStrategy::ForwardNextToken {
                ForwardState::AwaitingToken
            } else {
                ForwardState::Idle
            };
            debug!(target: "kindaxml::engine", "open <{name}> recognized, recovery={strategy}");
            self.stack.push(PendingOpen {
                name: name.to_string(),
                attrs,
                start: self.output_len,
                line_start: self.line_start,
                strategy,
                forward_state,
            });
        } else {
            self.handle_unknown(name, raw);
        }
    }

    fn handle_self_close(&mut self, name: &str, attrs: IndexMap<String, AttrValue>, raw: &str) {
        self.sweep_top_for_new_tag_event(false);
        if self.config.is_recognized(name) {
            debug!(target: "kindaxml::engine", "self-close <{name}/> recognized, marker emitted");
            self.markers.push(Marker {
                pos: self.output_len,
                annotation: Annotation::new(name.to_string(), attrs),
            });
        } else {
            self.handle_unknown(name, raw);
        }
    }

    /// Emits `raw` (the tag's exact original source) verbatim when
    /// `unknown_mode = passthrough`; drops it otherwise. Used for both
    /// unrecognized open/self-close and unrecognized close tags.
    fn handle_unknown(&mut self, name: &str, raw: &str) {
        match self.config.unknown_mode() {
            UnknownMode::Strip => {
                trace!(target: "kindaxml::engine", "unrecognized <{name}> stripped");
            }
            UnknownMode::Passthrough => {
                self.emit_text(raw);
            }
        }
    }

    fn handle_close(&mut self, name: &str, raw: &str) {
        if self.config.is_recognized(name) {
            match self.stack.iter().rposition(|p| p.name == name) {
                Some(idx) => {
                    while self.stack.len() > idx + 1 {
                        let pending = self.stack.pop().expect("len checked above");
                        let trigger = self.output_len;
                        self.recover(pending, trigger);
                    }
                    let matched = self.stack.pop().expect("idx is a valid stack index");
                    debug!(target: "kindaxml::engine", "close </{name}> matched, closed_span emitted");
                    self.emit_span_or_marker(
                        matched.start,
                        self.output_len,
                        Annotation::new(matched.name, matched.attrs),
                    );
                }
                None => {
                    trace!(target: "kindaxml::engine", "stray close </{name}> ignored");
                    self.diagnostics.push(Diagnostic {
                        pos: self.output_len,
                        kind: DiagnosticKind::StrayClose,
                    });
                }
            }
        } else {
            // Unknown `unknown_mode = passthrough` does not apply the stray-close
            // silent drop above; unrecognized close tags just follow unknown_mode.
            match self.config.unknown_mode() {
                UnknownMode::Strip => {}
                UnknownMode::Passthrough => self.emit_text(raw),
            }
        }
    }

    fn finish(mut self) -> RunOutput {
        while let Some(pending) = self.stack.pop() {
            let trigger = self.output_len;
            self.recover(pending, trigger);
        }
        RunOutput {
            text: self.output,
            len: self.output_len,
            spans: self.spans,
            markers: self.markers,
            diagnostics: self.diagnostics,
        }
    }
}

pub(crate) fn run(input: &str, config: &ParserConfig) -> RunOutput {
    let mut engine = Engine::new(config);
    let mut lexer = Lexer::new(input);
    loop {
        let token = lexer.next_token(&mut engine.diagnostics);
        match token {
            Some(Token::TextRun(text)) => engine.emit_text(text),
            Some(Token::Open { name, attrs, raw }) => engine.handle_open(name, attrs, raw),
            Some(Token::Close { name, raw }) => engine.handle_close(name, raw),
            Some(Token::SelfClose { name, attrs, raw }) => engine.handle_self_close(name, attrs, raw),
            None => break,
        }
    }
    engine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn run_default(input: &str) -> RunOutput {
        run(input, &ParserConfig::default_cite_config())
    }

    #[test]
    fn closed_span_scenario() {
        let out = run_default("We shipped <cite id=1>last week</cite>.");
        assert_eq!(out.text, "We shipped last week.");
        assert_eq!(out.spans.len(), 1);
        assert_eq!(out.spans[0].start, 11);
        assert_eq!(out.spans[0].end, 20);
        assert_eq!(out.spans[0].annotation.tag, "cite");
        assert!(out.markers.is_empty());
    }

    #[test]
    fn self_closing_marker_scenario() {
        let out = run_default("Todo <todo id=3/>now");
        assert_eq!(out.text, "Todo now");
        assert_eq!(out.markers.len(), 1);
        assert_eq!(out.markers[0].pos, 5);
        assert_eq!(out.markers[0].annotation.tag, "todo");
    }

    #[test]
    fn retro_line_and_forward_until_tag_scenario() {
        let out = run_default("We shipped last week <cite id=1>. More info <note>soon.");
        // "We shipped last week <cite id=1>" -> cite recovers backward to line start.
        let cite = out
            .spans
            .iter()
            .find(|s| s.annotation.tag == "cite")
            .expect("cite span");
        assert_eq!(&out.text[..cite.end], "We shipped last week ");
        assert_eq!(cite.start, 0);
        let note = out
            .spans
            .iter()
            .find(|s| s.annotation.tag == "note")
            .expect("note span");
        assert_eq!(&out.text[note.start..], "soon.");
        assert_eq!(note.end, out.text.chars().count());
    }

    #[test]
    fn forward_next_token_scenario() {
        let cfg = ParserConfig::new()
            .with_recognized_tags(["mytag", "risk"])
            .with_recovery_strategy("mytag", RecoveryStrategy::RetroLine)
            .with_recovery_strategy("risk", RecoveryStrategy::ForwardNextToken);
        let out = run(
            "Risks: <mytag level=high> load tests are late. <risk level=low>Docs slipping.",
            &cfg,
        );
        let mytag = out.spans.iter().find(|s| s.annotation.tag == "mytag").unwrap();
        assert_eq!(&out.text[mytag.start..mytag.end], "Risks: ");
        let risk = out.spans.iter().find(|s| s.annotation.tag == "risk").unwrap();
        assert_eq!(&out.text[risk.start..risk.end], "Docs");
    }

    #[test]
    fn unknown_strip_scenario() {
        let out = run_default("Hello <unknown>world</unknown>");
        assert_eq!(out.text, "Hello world");
        assert!(out.spans.is_empty());
    }

    #[test]
    fn unknown_passthrough_scenario() {
        let mut cfg = ParserConfig::new();
        cfg.set_recognized_tags(["note"]);
        cfg.set_unknown_mode("passthrough").unwrap();
        let out = run("Hello <weird>world</weird> <note>ok</note>", &cfg);
        assert_eq!(out.text, "Hello <weird>world</weird> ok");
        let note = out.spans.iter().find(|s| s.annotation.tag == "note").unwrap();
        assert_eq!(&out.text[note.start..note.end], "ok");
    }

    #[test]
    fn zero_width_recovery_becomes_marker() {
        let out = run_default("<cite id=1></cite>");
        assert!(out.spans.is_empty());
        assert_eq!(out.markers.len(), 1);
        assert_eq!(out.markers[0].pos, 0);
        assert_eq!(out.markers[0].annotation.tag, "cite");
    }

    #[test]
    fn forward_until_tag_stops_at_next_tag_not_just_eof() {
        let out = run_default("<note>before<risk level=1>after</risk>");
        let note = out.spans.iter().find(|s| s.annotation.tag == "note").unwrap();
        assert_eq!(&out.text[note.start..note.end], "before");
    }

    #[test]
    fn self_close_does_not_sweep_a_retro_line_pending_open() {
        // A self-closing tag must not auto-close a `retro_line` pending open
        // (only an `OpenTag` event does); otherwise the later explicit
        // `</cite>` finds nothing on the stack and becomes a stray close.
        let out = run_default("Some line <cite id=1>middle <todo/> end</cite>.");
        let cite = out
            .spans
            .iter()
            .find(|s| s.annotation.tag == "cite")
            .expect("cite span from explicit close");
        assert_eq!(&out.text[cite.start..cite.end], "middle  end");
        assert!(!out
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::StrayClose));
    }

    #[test]
    fn self_close_still_sweeps_a_forward_until_tag_pending_open() {
        let out = run_default("<note>before<todo/>after</note>");
        let note = out.spans.iter().find(|s| s.annotation.tag == "note").unwrap();
        assert_eq!(&out.text[note.start..note.end], "before");
    }

    #[test]
    fn stray_close_is_ignored_and_diagnosed() {
        let out = run_default("hello </cite> world");
        assert_eq!(out.text, "hello  world");
        assert!(out.spans.is_empty());
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::StrayClose));
    }
}

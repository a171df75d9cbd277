//! Turns an engine run's flat `spans`/`markers` into the public, segmented
//! [`ParseResult`]: a breakpoint sweep over every span boundary, coalescing
//! adjacent runs that carry the same annotation sequence.

use crate::engine::{RunOutput, Span};
use crate::model::{Annotation, Marker, ParseResult, Segment};

/// Maps char offsets into `text` to byte offsets, so segments can be sliced
/// with ordinary string indexing. Index `text.chars().count()` (one past the
/// last char) maps to `text.len()`.
fn char_byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());
    offsets
}

/// Which spans are active over the half-open char interval `[lo, hi)`,
/// in the order they were emitted by the engine.
fn active_annotations(spans: &[Span], lo: usize, hi: usize) -> Vec<Annotation> {
    spans
        .iter()
        .filter(|s| s.start <= lo && s.end >= hi)
        .map(|s| s.annotation.clone())
        .collect()
}

pub(crate) fn materialize(run: RunOutput) -> ParseResult {
    let RunOutput {
        text,
        len,
        spans,
        markers,
        diagnostics,
    } = run;

    let mut markers: Vec<Marker> = markers;
    markers.sort_by_key(|m| m.pos);

    if spans.is_empty() && len == 0 {
        return ParseResult {
            text,
            segments: vec![Segment {
                text: String::new(),
                annotations: Vec::new(),
            }],
            markers,
            diagnostics,
        };
    }

    let mut breakpoints: Vec<usize> = Vec::with_capacity(2 + spans.len() * 2);
    breakpoints.push(0);
    breakpoints.push(len);
    for span in &spans {
        breakpoints.push(span.start);
        breakpoints.push(span.end);
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let byte_at = char_byte_offsets(&text);
    let mut segments: Vec<Segment> = Vec::with_capacity(breakpoints.len());

    for window in breakpoints.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        let annotations = active_annotations(&spans, lo, hi);
        let slice = &text[byte_at[lo]..byte_at[hi]];
        match segments.last_mut() {
            Some(prev) if prev.annotations == annotations => {
                prev.text.push_str(slice);
            }
            _ => segments.push(Segment {
                text: slice.to_string(),
                annotations,
            }),
        }
    }

    ParseResult {
        text,
        segments,
        markers,
        diagnostics,
    }
}

//! Streaming directive parser.
//!
//! Narration arrives in arbitrary chunks. While it streams, [`StreamingParser::push`] returns the
//! prose seen so far with every *complete* directive removed; a directive still being written at
//! the tail is held back and never treated as complete. [`StreamingParser::finish`] runs the final
//! pass once the stream has ended and yields the display text plus the ordered directives.
use crate::directive::{DirectiveOccurrence, TAG_SEPARATOR, Tag};
use std::ops::Range;
use strum::IntoEnumIterator;

// Artifact the upstream text source sometimes appends to a response.
const UNDEFINED_ARTIFACT: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub text: String,                         // Final displayable prose.
    pub directives: Vec<DirectiveOccurrence>, // Complete, non-legacy directives in textual order.
    pub truncated: Option<String>,            // A directive cut off by the end of the stream.
}

#[derive(Debug, Default)]
pub struct StreamingParser {
    buffer: String,
}

impl StreamingParser {
    pub fn new() -> Self {
        Self::default()
    }

    // Append a chunk and return the current best-effort displayable text.
    pub fn push(&mut self, chunk: &str) -> String {
        self.buffer.push_str(chunk);
        self.displayable()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn displayable(&self) -> String {
        let text = trim_undefined(&self.buffer);
        let scan = scan(text, false);
        let last_match_end = scan.matches.last().map_or(0, |m| m.span.end);
        let visible_end = scan
            .pending_from
            .or_else(|| partial_tag_start(text).map(|start| start.max(last_match_end)))
            .unwrap_or(text.len());
        let matches: Vec<&TagMatch> = scan
            .matches
            .iter()
            .filter(|m| m.span.end <= visible_end)
            .collect();
        strip_spans(&text[..visible_end], matches.iter().map(|m| m.span.clone()))
    }

    pub fn finish(self) -> ParsedResponse {
        finalize(&self.buffer)
    }
}

// Final pass over a complete response.
pub fn finalize(raw: &str) -> ParsedResponse {
    let text = trim_undefined(raw);
    let scan = scan(text, true);

    let truncated = scan.pending_from.map(|start| {
        let tail = text[start..].to_string();
        log::warn!("Dropping directive truncated by end of stream: {tail:?}");
        tail
    });
    let visible_end = scan.pending_from.unwrap_or(text.len());

    let directives = scan
        .matches
        .iter()
        .filter_map(|m| {
            let kind = m.tag.kind()?;
            Some(DirectiveOccurrence {
                kind,
                payload: text[m.payload.clone()].to_string(),
                span: m.span.clone(),
            })
        })
        .collect();

    ParsedResponse {
        text: strip_spans(&text[..visible_end], scan.matches.iter().map(|m| m.span.clone())),
        directives,
        truncated,
    }
}

// Removes a trailing "undefined" artifact, then surrounding whitespace.
pub fn trim_undefined(text: &str) -> &str {
    let trimmed = text.trim_end();
    trimmed
        .strip_suffix(UNDEFINED_ARTIFACT)
        .unwrap_or(trimmed)
        .trim()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TagMatch {
    tag: Tag,
    span: Range<usize>,
    payload: Range<usize>,
}

#[derive(Debug, Default)]
struct Scan {
    matches: Vec<TagMatch>,
    pending_from: Option<usize>, // Start of a directive the text ends inside of.
}

enum Payload {
    Complete(Range<usize>),
    Incomplete(usize), // Payload starting here does not close before the text ends.
    Absent,            // The tag is not followed by an object or `null`; it stays prose.
}

// `at_end` is set for the final pass: nothing more will arrive, so a payload that never closes
// but has text after it is malformed rather than still being written.
fn scan(text: &str, at_end: bool) -> Scan {
    let mut scan = Scan::default();
    let mut cursor = 0;

    while let Some((start, tag)) = next_tag(text, cursor) {
        let after_tag = start + tag.literal().len();
        let rest = &text[after_tag..];

        if !rest.starts_with(TAG_SEPARATOR) {
            if TAG_SEPARATOR.starts_with(rest) && !at_end {
                scan.pending_from = Some(start);
                break;
            }
            cursor = after_tag;
            continue;
        }

        match payload_at(text, after_tag + TAG_SEPARATOR.len()) {
            Payload::Complete(payload) => {
                cursor = payload.end;
                scan.matches.push(TagMatch {
                    tag,
                    span: start..payload.end,
                    payload,
                });
            }
            Payload::Incomplete(payload_start) => {
                let bound = at_end.then(|| malformed_end(text, payload_start)).flatten();
                let Some(end) = bound else {
                    scan.pending_from = Some(start);
                    break;
                };
                log::warn!(
                    "Unbalanced {} payload cut off at the next boundary: {:?}",
                    tag.literal(),
                    &text[payload_start..end]
                );
                cursor = end;
                scan.matches.push(TagMatch {
                    tag,
                    span: start..end,
                    payload: payload_start..end,
                });
            }
            Payload::Absent => cursor = after_tag,
        }
    }
    scan
}

// Where an unbalanced payload ends: the first `}`, the next tag or the end of the line,
// whichever comes first. `None` when none of them follow, so the directive really is cut off.
fn malformed_end(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start..];
    let first_close = rest.find('}').map(|offset| start + offset + 1);
    let line_end = rest.find('\n').map(|offset| start + offset);
    let next = rest
        .char_indices()
        .nth(1)
        .and_then(|(offset, _)| next_tag(text, start + offset))
        .map(|(position, _)| position);
    [first_close, line_end, next].into_iter().flatten().min()
}

// Earliest tag literal at or after `from`.
fn next_tag(text: &str, from: usize) -> Option<(usize, Tag)> {
    let haystack = &text[from..];
    Tag::iter()
        .filter_map(|tag| haystack.find(tag.literal()).map(|offset| (from + offset, tag)))
        .min_by_key(|(position, _)| *position)
}

fn payload_at(text: &str, from: usize) -> Payload {
    let bytes = text.as_bytes();
    let start = from
        + bytes[from..]
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();

    let rest = &text[start..];
    if rest.is_empty() {
        return Payload::Incomplete(start);
    }
    if rest.starts_with("null") {
        return Payload::Complete(start..start + "null".len());
    }
    if "null".starts_with(rest) {
        return Payload::Incomplete(start);
    }
    if !rest.starts_with('{') {
        return Payload::Absent;
    }
    match balanced_object_end(bytes, start) {
        Some(end) => Payload::Complete(start..end),
        None => Payload::Incomplete(start),
    }
}

// Brace-depth state machine over a JSON object starting at `start` (a `{`).
// Braces inside string literals do not count. Returns the exclusive end of the object.
fn balanced_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

// Start of a trailing fragment that could still grow into `TAG::`.
fn partial_tag_start(text: &str) -> Option<usize> {
    Tag::iter()
        .filter_map(|tag| {
            let literal = tag.literal();
            (1..literal.len())
                .rev()
                .find(|len| text.ends_with(&literal[..*len]))
                .map(|len| text.len() - len)
        })
        .min()
}

// Remove spans from the text, collapsing the whitespace around each removal.
fn strip_spans(text: &str, spans: impl Iterator<Item = Range<usize>>) -> String {
    let mut pieces = Vec::new();
    let mut cursor = 0;
    for span in spans {
        if span.start > text.len() {
            break;
        }
        pieces.push(&text[cursor..span.start]);
        cursor = span.end.min(text.len());
    }
    pieces.push(&text[cursor..]);

    let mut output = String::new();
    let mut gap = Gap::default();
    for piece in pieces {
        let body = piece.trim_start();
        gap.absorb(&piece[..piece.len() - body.len()]);
        if body.is_empty() {
            continue;
        }
        let core = body.trim_end();
        if !output.is_empty() {
            output.push_str(gap.separator());
        }
        output.push_str(core);
        gap = Gap::default();
        gap.absorb(&body[core.len()..]);
    }
    output
}

// Whitespace left around removed spans. The widest run on either side decides the separator,
// so a directive on its own line does not turn into a paragraph break.
#[derive(Default)]
struct Gap {
    newlines: usize,
    spaced: bool,
}

impl Gap {
    fn absorb(&mut self, whitespace: &str) {
        self.newlines = self.newlines.max(whitespace.matches('\n').count());
        self.spaced |= !whitespace.is_empty();
    }

    fn separator(&self) -> &'static str {
        match (self.newlines, self.spaced) {
            (0, false) => "",
            (0, true) => " ",
            (1, _) => "\n",
            _ => "\n\n",
        }
    }
}

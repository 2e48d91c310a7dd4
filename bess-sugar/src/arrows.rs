//! Pipeline-connect rewriting.
//!
//! `a:1 -> 2:b` becomes `a,1 ;  2,b`: the arrow is cut out and replaced by a
//! statement separator, gate colons next to it become commas. Line count never
//! changes, so every row without sugar keeps its original text.

use tracing::debug;

use crate::gate_expr::{GateDir, is_gate_expr};
use crate::source_map::{char_col_to_byte, split_lines};
use crate::tokenizer::{Token, TokenKind, tokenize};

pub const ARROW: &str = "->";
pub const SEGMENT_SEPARATOR: &str = "; ";

/// Start of a pipeline-connect operator: 0-indexed row, character column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrowPosition {
    pub row: usize,
    pub col: usize,
}

impl ArrowPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Finds every arrow in a token stream, whether the scanner produced it as one
/// `->` token or as `-` immediately followed by `>`.
pub fn find_arrows(tokens: &[Token]) -> Vec<ArrowPosition> {
    let mut arrows = Vec::new();
    let mut previous: Option<&Token> = None;
    for token in tokens {
        if token.is_op(ARROW) {
            arrows.push(ArrowPosition::new(token.row.saturating_sub(1), token.col));
        } else if token.is_op(">")
            && let Some(prev) = previous
            && prev.kind == TokenKind::Op
            && prev.text == "-"
            && prev.row == token.row
            && prev.col + 1 == token.col
        {
            arrows.push(ArrowPosition::new(token.row.saturating_sub(1), prev.col));
        }
        previous = Some(token);
    }
    arrows
}

pub fn replace_arrows(source: &str) -> (String, Vec<ArrowPosition>) {
    let tokenized = tokenize(source);
    if let Some(err) = &tokenized.error {
        debug!("scanner stopped early, rewriting recognised prefix only: {err}");
    }

    let mut arrows = find_arrows(&tokenized.tokens);
    arrows.sort();
    arrows.dedup();
    if arrows.is_empty() {
        return (source.to_string(), arrows);
    }

    let mut segments = split_segments(source, &arrows);
    rewrite_gates(&mut segments);
    (segments.join(SEGMENT_SEPARATOR), arrows)
}

/// Cuts `source` at every arrow, dropping the two arrow characters.
/// `arrows` must be sorted; the result has `arrows.len() + 1` segments.
pub fn split_segments(source: &str, arrows: &[ArrowPosition]) -> Vec<String> {
    let mut segments = Vec::with_capacity(arrows.len() + 1);
    let mut current = String::new();
    let mut pending = arrows.iter().peekable();

    for (row, line) in split_lines(source).into_iter().enumerate() {
        let mut offset = 0usize;
        while let Some(arrow) = pending.next_if(|arrow| arrow.row <= row) {
            let cut = char_col_to_byte(line, arrow.col).max(offset);
            current.push_str(&line[offset..cut]);
            segments.push(std::mem::take(&mut current));
            offset = char_col_to_byte(line, arrow.col + ARROW.len()).max(cut);
        }
        current.push_str(&line[offset..]);
    }

    // Arrows past the end of the text still delimit (empty) segments.
    for _ in pending {
        segments.push(std::mem::take(&mut current));
    }
    segments.push(current);
    segments
}

fn rewrite_gates(segments: &mut [String]) {
    for idx in 0..segments.len().saturating_sub(1) {
        if let Some(rewritten) = rewrite_output_gate(&segments[idx]) {
            segments[idx] = rewritten;
        }
        if let Some(rewritten) = rewrite_input_gate(&segments[idx + 1]) {
            segments[idx + 1] = rewritten;
        }
    }
}

/// `src:gate` at the end of a segment, searching colons right to left.
fn rewrite_output_gate(segment: &str) -> Option<String> {
    let mut search_end = segment.len();
    while let Some(colon) = segment[..search_end].rfind(':') {
        let gate = &segment[colon + 1..];
        if gate.trim().is_empty() {
            return None;
        }
        if is_gate_expr(gate, GateDir::Output) {
            return Some(format!("{},{gate}", &segment[..colon]));
        }
        search_end = colon;
    }
    None
}

/// `gate:dst` at the start of a segment, searching colons left to right.
fn rewrite_input_gate(segment: &str) -> Option<String> {
    let mut search_from = 0usize;
    while let Some(found) = segment[search_from..].find(':') {
        let colon = search_from + found;
        let gate = &segment[..colon];
        if gate.trim().is_empty() {
            return None;
        }
        if is_gate_expr(gate, GateDir::Input) {
            return Some(format!("{gate},{}", &segment[colon + 1..]));
        }
        search_from = colon + 1;
    }
    None
}

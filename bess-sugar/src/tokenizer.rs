//! Line-oriented scanner for pipeline scripts.
//!
//! The scanner follows the host grammar's lexical rules closely enough to find
//! operators, strings and comments reliably. It never fails hard: when it hits
//! an error it cannot recover from, it returns the tokens produced so far
//! together with the error.

use crate::source_map::split_lines;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    ErrorToken,
    EndMarker,
}

/// A lexical token. `row` is 1-indexed, `col` is a 0-indexed character column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub row: usize,
    pub col: usize,
}

impl Token {
    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Op && self.text == text
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    EofInMultiLineString { row: usize, col: usize },
    EofInMultiLineStatement { row: usize },
    InconsistentDedent { row: usize },
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::EofInMultiLineString { row, col } => {
                write!(f, "EOF in multi-line string starting at {row}:{col}")
            }
            LexError::EofInMultiLineStatement { row } => {
                write!(f, "EOF in multi-line statement at line {row}")
            }
            LexError::InconsistentDedent { row } => write!(
                f,
                "unindent does not match any outer indentation level at line {row}"
            ),
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub error: Option<LexError>,
}

impl Tokenized {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

const OPERATORS_3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const OPERATORS_2: &[&str] = &[
    "->", "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "@=", ":=",
];
const OPERATORS_1: &str = "+-*/%&|^~<>()[]{},:;.=@";

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

pub fn tokenize(source: &str) -> Tokenized {
    let mut lexer = Lexer::new(source);
    let error = lexer.run().err();
    Tokenized {
        tokens: lexer.tokens,
        error,
    }
}

struct PendingString {
    row: usize,
    col: usize,
    quote: Vec<char>,
    text: String,
}

struct Lexer<'a> {
    lines: Vec<&'a str>,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    paren_depth: usize,
    continued: bool,
    pending: Option<PendingString>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: split_lines(source),
            tokens: Vec::new(),
            indents: vec![0],
            paren_depth: 0,
            continued: false,
            pending: None,
        }
    }

    fn run(&mut self) -> Result<(), LexError> {
        let lines = std::mem::take(&mut self.lines);
        for (index, line) in lines.iter().enumerate() {
            self.scan_line(index + 1, line)?;
        }
        self.finish(&lines)
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, row: usize, col: usize) {
        self.tokens.push(Token {
            kind,
            text: text.into(),
            row,
            col,
        });
    }

    fn scan_line(&mut self, row: usize, line: &str) -> Result<(), LexError> {
        let chars: Vec<char> = line.chars().collect();
        let mut pos = 0usize;

        if let Some(mut pending) = self.pending.take() {
            match find_string_end(&chars, 0, &pending.quote) {
                Some(end) => {
                    pending.text.extend(&chars[..end]);
                    self.push(TokenKind::String, pending.text, pending.row, pending.col);
                    pos = end;
                }
                None if pending.quote.len() == 1 && !ends_with_continuation(line) => {
                    pending.text.push_str(line);
                    self.push(TokenKind::ErrorToken, pending.text, pending.row, pending.col);
                    return Ok(());
                }
                None => {
                    pending.text.push_str(line);
                    self.pending = Some(pending);
                    return Ok(());
                }
            }
        } else if self.paren_depth == 0 && !self.continued {
            let mut column = 0usize;
            while pos < chars.len() {
                match chars[pos] {
                    ' ' => column += 1,
                    '\t' => column = (column / 8 + 1) * 8,
                    '\x0c' => column = 0,
                    _ => break,
                }
                pos += 1;
            }
            if pos == chars.len() {
                return Ok(());
            }

            if matches!(chars[pos], '#' | '\r' | '\n') {
                if chars[pos] == '#' {
                    let end = line_content_end(&chars, pos);
                    self.push(
                        TokenKind::Comment,
                        collect(&chars[pos..end]),
                        row,
                        pos,
                    );
                    pos = end;
                }
                if pos < chars.len() {
                    self.push(TokenKind::Nl, collect(&chars[pos..]), row, pos);
                }
                return Ok(());
            }

            let current = self.indents.last().copied().unwrap_or(0);
            if column > current {
                self.indents.push(column);
                self.push(TokenKind::Indent, collect(&chars[..pos]), row, 0);
            }
            while column < self.indents.last().copied().unwrap_or(0) {
                if !self.indents.contains(&column) {
                    return Err(LexError::InconsistentDedent { row });
                }
                self.indents.pop();
                self.push(TokenKind::Dedent, "", row, pos);
            }
        } else {
            self.continued = false;
        }

        while pos < chars.len() {
            let ch = chars[pos];
            match ch {
                ' ' | '\t' | '\x0c' => pos += 1,
                '#' => {
                    let end = line_content_end(&chars, pos);
                    self.push(TokenKind::Comment, collect(&chars[pos..end]), row, pos);
                    pos = end;
                }
                '\r' | '\n' => {
                    let kind = if self.paren_depth > 0 {
                        TokenKind::Nl
                    } else {
                        TokenKind::Newline
                    };
                    self.push(kind, collect(&chars[pos..]), row, pos);
                    pos = chars.len();
                }
                '\\' => {
                    if is_line_break(&chars[pos + 1..]) {
                        self.continued = true;
                        pos = chars.len();
                    } else {
                        self.push(TokenKind::ErrorToken, "\\", row, pos);
                        pos += 1;
                    }
                }
                '\'' | '"' => pos = self.scan_string(row, line, &chars, pos, pos),
                c if c.is_ascii_digit()
                    || (c == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit)) =>
                {
                    let end = number_end(&chars, pos);
                    self.push(TokenKind::Number, collect(&chars[pos..end]), row, pos);
                    pos = end;
                }
                c if is_ident_start(c) => {
                    let mut end = pos;
                    while end < chars.len() && is_ident_continue(chars[end]) {
                        end += 1;
                    }
                    let word = collect(&chars[pos..end]);
                    let quote_follows = matches!(chars.get(end), Some('\'' | '"'));
                    if quote_follows
                        && STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str())
                    {
                        pos = self.scan_string(row, line, &chars, pos, end);
                    } else {
                        self.push(TokenKind::Name, word, row, pos);
                        pos = end;
                    }
                }
                _ => match match_operator(&chars[pos..]) {
                    Some(op) => {
                        match op {
                            "(" | "[" | "{" => self.paren_depth += 1,
                            ")" | "]" | "}" => {
                                self.paren_depth = self.paren_depth.saturating_sub(1)
                            }
                            _ => {}
                        }
                        self.push(TokenKind::Op, op, row, pos);
                        pos += op.chars().count();
                    }
                    None => {
                        self.push(TokenKind::ErrorToken, ch.to_string(), row, pos);
                        pos += 1;
                    }
                },
            }
        }
        Ok(())
    }

    /// Scans a string literal whose prefix starts at `start` and whose opening
    /// quote is at `quote_pos`. Returns the position to resume scanning from.
    fn scan_string(
        &mut self,
        row: usize,
        line: &str,
        chars: &[char],
        start: usize,
        quote_pos: usize,
    ) -> usize {
        let quote_char = chars[quote_pos];
        let triple = chars.get(quote_pos + 1) == Some(&quote_char)
            && chars.get(quote_pos + 2) == Some(&quote_char);
        let quote: Vec<char> = if triple {
            vec![quote_char; 3]
        } else {
            vec![quote_char]
        };
        let body_start = quote_pos + quote.len();

        if let Some(end) = find_string_end(chars, body_start, &quote) {
            self.push(TokenKind::String, collect(&chars[start..end]), row, start);
            return end;
        }

        if triple || ends_with_continuation(line) {
            self.pending = Some(PendingString {
                row,
                col: start,
                quote,
                text: collect(&chars[start..]),
            });
            return chars.len();
        }

        self.push(
            TokenKind::ErrorToken,
            collect(&chars[start..=quote_pos]),
            row,
            start,
        );
        quote_pos + 1
    }

    fn finish(&mut self, lines: &[&str]) -> Result<(), LexError> {
        if let Some(pending) = self.pending.take() {
            return Err(LexError::EofInMultiLineString {
                row: pending.row,
                col: pending.col,
            });
        }
        let last_row = lines.len();
        if self.paren_depth > 0 || self.continued {
            return Err(LexError::EofInMultiLineStatement { row: last_row });
        }

        if let Some(last) = lines.last()
            && !last.ends_with(['\n', '\r'])
            && !last.trim().starts_with('#')
        {
            self.push(TokenKind::Newline, "", last_row, last.chars().count());
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, "", last_row + 1, 0);
        }
        self.push(TokenKind::EndMarker, "", last_row + 1, 0);
        Ok(())
    }
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_line_break(rest: &[char]) -> bool {
    matches!(rest, ['\n'] | ['\r', '\n'] | ['\r'])
}

fn ends_with_continuation(line: &str) -> bool {
    line.ends_with("\\\n") || line.ends_with("\\\r\n")
}

fn line_content_end(chars: &[char], from: usize) -> usize {
    chars[from..]
        .iter()
        .position(|c| matches!(c, '\r' | '\n'))
        .map(|offset| from + offset)
        .unwrap_or(chars.len())
}

fn find_string_end(chars: &[char], from: usize, quote: &[char]) -> Option<usize> {
    let mut idx = from;
    while idx < chars.len() {
        if chars[idx] == '\\' {
            idx += 2;
            continue;
        }
        if chars[idx..].starts_with(quote) {
            return Some(idx + quote.len());
        }
        idx += 1;
    }
    None
}

fn number_end(chars: &[char], start: usize) -> usize {
    let mut idx = start;
    let radix_prefixed = chars[idx] == '0'
        && matches!(
            chars.get(idx + 1),
            Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')
        );
    if radix_prefixed {
        idx += 2;
        while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '_') {
            idx += 1;
        }
        return idx;
    }

    let digits = |idx: &mut usize| {
        while *idx < chars.len() && (chars[*idx].is_ascii_digit() || chars[*idx] == '_') {
            *idx += 1;
        }
    };
    digits(&mut idx);
    if chars.get(idx) == Some(&'.') {
        idx += 1;
        digits(&mut idx);
    }
    if matches!(chars.get(idx), Some('e' | 'E')) {
        let mut exp = idx + 1;
        if matches!(chars.get(exp), Some('+' | '-')) {
            exp += 1;
        }
        if chars.get(exp).is_some_and(char::is_ascii_digit) {
            idx = exp;
            digits(&mut idx);
        }
    }
    if matches!(chars.get(idx), Some('j' | 'J')) {
        idx += 1;
    }
    idx
}

fn starts_with_op(rest: &[char], op: &str) -> bool {
    op.chars().count() <= rest.len() && op.chars().zip(rest).all(|(a, b)| a == *b)
}

fn match_operator(rest: &[char]) -> Option<&'static str> {
    if let Some(op) = OPERATORS_3
        .iter()
        .copied()
        .find(|op| starts_with_op(rest, op))
    {
        return Some(op);
    }
    if let Some(op) = OPERATORS_2
        .iter()
        .copied()
        .find(|op| starts_with_op(rest, op))
    {
        return Some(op);
    }
    let first = *rest.first()?;
    let idx = OPERATORS_1.find(first)?;
    OPERATORS_1.get(idx..idx + first.len_utf8())
}

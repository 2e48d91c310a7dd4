//! Gate-index expressions.
//!
//! A colon next to an arrow is gate sugar only when the text on its far side
//! is a small arithmetic expression. The check runs the candidate through two
//! probes with a dedicated parser: once wrapped in parentheses, and once glued
//! between direction-specific operands, so that unbalanced or low-precedence
//! text is rejected.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDir {
    Output,
    Input,
}

impl GateDir {
    fn probe_affixes(self) -> (&'static str, &'static str) {
        match self {
            GateDir::Output => ("1*", "+1"),
            GateDir::Input => ("1+", "*1"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateParseError {
    pub offset: usize,
    pub message: String,
}

impl std::fmt::Display for GateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for GateParseError {}

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

pub fn is_gate_expr(exp: &str, dir: GateDir) -> bool {
    let stripped = strip_continuations(exp);
    if stripped.is_empty() {
        return false;
    }
    let (prefix, suffix) = dir.probe_affixes();
    parse_gate_expr(&format!("({stripped})")).is_ok()
        && parse_gate_expr(&format!("{prefix}{exp}{suffix}")).is_ok()
}

fn strip_continuations(exp: &str) -> &str {
    let mut stripped = exp.trim();
    while let Some(rest) = stripped.strip_suffix('\\') {
        stripped = rest.trim();
    }
    stripped
}

/// Parses `source` as a complete gate expression.
pub fn parse_gate_expr(source: &str) -> Result<(), GateParseError> {
    let tokens = lex(source)?;
    let mut parser = GateParser { tokens, pos: 0 };
    parser.parse_expr()?;
    while parser.check(&GateTokenKind::Newline) {
        parser.pos += 1;
    }
    if !parser.check(&GateTokenKind::End) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum GateTokenKind {
    Number,
    Str,
    Name(String),
    Op(&'static str),
    Newline,
    End,
}

#[derive(Clone, Debug)]
struct GateToken {
    kind: GateTokenKind,
    offset: usize,
}

const GATE_OPERATORS: &[&str] = &[
    "**", "//", "+", "-", "*", "/", "%", "(", ")", "[", "]", ".", ",", "=",
];

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

fn lex(source: &str) -> Result<Vec<GateToken>, GateParseError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut idx = 0usize;

    while idx < chars.len() {
        let (offset, ch) = chars[idx];
        match ch {
            ' ' | '\t' | '\x0c' => idx += 1,
            '#' => {
                while idx < chars.len() && chars[idx].1 != '\n' {
                    idx += 1;
                }
            }
            '\\' => {
                let rest: String = chars[idx + 1..].iter().take(2).map(|(_, c)| *c).collect();
                if rest.starts_with('\n') {
                    idx += 2;
                } else if rest.starts_with("\r\n") {
                    idx += 3;
                } else {
                    return Err(GateParseError {
                        offset,
                        message: "unexpected character after line continuation".to_string(),
                    });
                }
            }
            '\r' | '\n' => {
                if depth == 0 {
                    tokens.push(GateToken {
                        kind: GateTokenKind::Newline,
                        offset,
                    });
                }
                idx += 1;
            }
            c if c.is_ascii_digit()
                || (c == '.' && chars.get(idx + 1).is_some_and(|(_, n)| n.is_ascii_digit())) =>
            {
                idx = lex_number(&chars, idx)?;
                tokens.push(GateToken {
                    kind: GateTokenKind::Number,
                    offset,
                });
            }
            '\'' | '"' => {
                idx = lex_string(&chars, idx)?;
                tokens.push(GateToken {
                    kind: GateTokenKind::Str,
                    offset,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = idx;
                while idx < chars.len() && (chars[idx].1.is_alphanumeric() || chars[idx].1 == '_')
                {
                    idx += 1;
                }
                let name: String = chars[start..idx].iter().map(|(_, c)| *c).collect();
                let quoted = chars.get(idx).is_some_and(|(_, c)| matches!(c, '\'' | '"'));
                if quoted && STRING_PREFIXES.contains(&name.to_ascii_lowercase().as_str()) {
                    idx = lex_string(&chars, idx)?;
                    tokens.push(GateToken {
                        kind: GateTokenKind::Str,
                        offset,
                    });
                    continue;
                }
                tokens.push(GateToken {
                    kind: GateTokenKind::Name(name),
                    offset,
                });
            }
            _ => {
                let op = GATE_OPERATORS
                    .iter()
                    .copied()
                    .find(|op| {
                        op.chars()
                            .enumerate()
                            .all(|(n, c)| chars.get(idx + n).is_some_and(|(_, x)| *x == c))
                    })
                    .ok_or_else(|| GateParseError {
                        offset,
                        message: format!("unexpected character '{ch}'"),
                    })?;
                match op {
                    "(" | "[" => depth += 1,
                    ")" | "]" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                tokens.push(GateToken {
                    kind: GateTokenKind::Op(op),
                    offset,
                });
                idx += op.len();
            }
        }
    }

    tokens.push(GateToken {
        kind: GateTokenKind::End,
        offset: source.len(),
    });
    Ok(tokens)
}

/// Returns the index just past the closing quote of the literal opening at
/// `start`. Single-quoted literals may not span lines.
fn lex_string(chars: &[(usize, char)], start: usize) -> Result<usize, GateParseError> {
    let quote = chars[start].1;
    let is_quote = |idx: usize| chars.get(idx).is_some_and(|(_, c)| *c == quote);
    let triple = is_quote(start + 1) && is_quote(start + 2);
    let width = if triple { 3 } else { 1 };
    let mut idx = start + width;
    while let Some(&(_, ch)) = chars.get(idx) {
        match ch {
            '\\' => idx += 2,
            '\r' | '\n' if !triple => break,
            _ if (0..width).all(|n| is_quote(idx + n)) => return Ok(idx + width),
            _ => idx += 1,
        }
    }
    Err(GateParseError {
        offset: chars[start].0,
        message: "unterminated string literal".to_string(),
    })
}

fn lex_number(chars: &[(usize, char)], start: usize) -> Result<usize, GateParseError> {
    let at = |idx: usize| chars.get(idx).map(|(_, c)| *c);
    let mut idx = start;
    let radix = match (at(idx), at(idx + 1)) {
        (Some('0'), Some('x' | 'X')) => Some(16),
        (Some('0'), Some('o' | 'O')) => Some(8),
        (Some('0'), Some('b' | 'B')) => Some(2),
        _ => None,
    };

    if let Some(radix) = radix {
        idx += 2;
        let digits_start = idx;
        while let Some(c) = at(idx) {
            if c.is_digit(radix) || c == '_' {
                idx += 1;
            } else {
                break;
            }
        }
        if idx == digits_start {
            return Err(GateParseError {
                offset: chars[start].0,
                message: "invalid number literal".to_string(),
            });
        }
    } else {
        let digits = |idx: &mut usize| {
            while at(*idx).is_some_and(|c| c.is_ascii_digit() || c == '_') {
                *idx += 1;
            }
        };
        digits(&mut idx);
        if at(idx) == Some('.') {
            idx += 1;
            digits(&mut idx);
        }
        if matches!(at(idx), Some('e' | 'E')) {
            let mut exp = idx + 1;
            if matches!(at(exp), Some('+' | '-')) {
                exp += 1;
            }
            if !at(exp).is_some_and(|c| c.is_ascii_digit()) {
                return Err(GateParseError {
                    offset: chars[start].0,
                    message: "invalid exponent".to_string(),
                });
            }
            idx = exp;
            digits(&mut idx);
        }
        if matches!(at(idx), Some('j' | 'J')) {
            idx += 1;
        }
    }

    if at(idx).is_some_and(|c| c.is_alphanumeric() || c == '_') {
        return Err(GateParseError {
            offset: chars[start].0,
            message: "invalid number literal".to_string(),
        });
    }
    Ok(idx)
}

struct GateParser {
    tokens: Vec<GateToken>,
    pos: usize,
}

impl GateParser {
    fn parse_expr(&mut self) -> Result<(), GateParseError> {
        self.parse_sum()
    }

    fn parse_sum(&mut self) -> Result<(), GateParseError> {
        self.parse_product()?;
        while self.match_op(&["+", "-"]) {
            self.parse_product()?;
        }
        Ok(())
    }

    fn parse_product(&mut self) -> Result<(), GateParseError> {
        self.parse_unary()?;
        while self.match_op(&["*", "/", "//", "%"]) {
            self.parse_unary()?;
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<(), GateParseError> {
        if self.match_op(&["+", "-"]) {
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<(), GateParseError> {
        self.parse_postfix()?;
        if self.match_op(&["**"]) {
            self.parse_unary()?;
        }
        Ok(())
    }

    fn parse_postfix(&mut self) -> Result<(), GateParseError> {
        self.parse_atom()?;
        loop {
            if self.match_op(&["."]) {
                match self.peek_kind() {
                    GateTokenKind::Name(_) => self.pos += 1,
                    _ => return Err(self.error("expected attribute name after '.'")),
                }
            } else if self.match_op(&["["]) {
                self.parse_expr()?;
                self.expect_op("]")?;
            } else if self.match_op(&["("]) {
                if !self.match_op(&[")"]) {
                    self.parse_call_args()?;
                    self.expect_op(")")?;
                }
            } else {
                return Ok(());
            }
        }
    }

    fn parse_call_args(&mut self) -> Result<(), GateParseError> {
        self.parse_call_arg()?;
        while self.match_op(&[","]) {
            if self.check(&GateTokenKind::Op(")")) {
                break;
            }
            self.parse_call_arg()?;
        }
        Ok(())
    }

    /// A positional argument or `name=value`.
    fn parse_call_arg(&mut self) -> Result<(), GateParseError> {
        let keyword = matches!(self.peek_kind(), GateTokenKind::Name(_))
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|token| token.kind == GateTokenKind::Op("="));
        if keyword {
            self.pos += 2;
        }
        self.parse_expr()
    }

    fn parse_atom(&mut self) -> Result<(), GateParseError> {
        match self.peek_kind().clone() {
            GateTokenKind::Number => {
                self.pos += 1;
                Ok(())
            }
            GateTokenKind::Str => {
                while self.check(&GateTokenKind::Str) {
                    self.pos += 1;
                }
                Ok(())
            }
            GateTokenKind::Name(name) => {
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(self.error(&format!("keyword '{name}' is not an expression")));
                }
                self.pos += 1;
                Ok(())
            }
            GateTokenKind::Op("(") => {
                self.pos += 1;
                self.parse_expr()?;
                self.expect_op(")")
            }
            _ => Err(self.error("expected expression")),
        }
    }

    fn peek_kind(&self) -> &GateTokenKind {
        self.tokens
            .get(self.pos)
            .map(|token| &token.kind)
            .unwrap_or(&GateTokenKind::End)
    }

    fn check(&self, kind: &GateTokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_op(&mut self, ops: &[&str]) -> bool {
        if let GateTokenKind::Op(op) = self.peek_kind()
            && ops.contains(op)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_op(&mut self, op: &'static str) -> Result<(), GateParseError> {
        if self.match_op(&[op]) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{op}'")))
        }
    }

    fn error(&self, message: &str) -> GateParseError {
        GateParseError {
            offset: self.tokens.get(self.pos).map(|token| token.offset).unwrap_or(0),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_sums_are_gate_expressions() {
        for exp in ["3", "j+1", " 0 ", "idx * 2", "gates[i]", "len(names) - 1", "0x1f"] {
            assert!(is_gate_expr(exp, GateDir::Output), "output {exp:?}");
            assert!(is_gate_expr(exp, GateDir::Input), "input {exp:?}");
        }
    }

    #[test]
    fn empty_and_blank_spans_never_validate() {
        for exp in ["", "   ", "\n", " \\\n "] {
            assert!(!is_gate_expr(exp, GateDir::Output));
            assert!(!is_gate_expr(exp, GateDir::Input));
        }
    }

    #[test]
    fn dictionary_and_slice_fragments_are_rejected() {
        assert!(!is_gate_expr(" 'value'}", GateDir::Output));
        assert!(!is_gate_expr("{'key'", GateDir::Input));
        assert!(!is_gate_expr("2]", GateDir::Output));
        assert!(!is_gate_expr("a) + (b", GateDir::Output));
    }

    #[test]
    fn statements_and_keywords_are_rejected() {
        assert!(!is_gate_expr("x = 3", GateDir::Input));
        assert!(!is_gate_expr("for j in range(i)", GateDir::Input));
        assert!(!is_gate_expr("else", GateDir::Output));
        assert!(!is_gate_expr("lambda", GateDir::Output));
    }

    #[test]
    fn newlines_only_pass_inside_brackets_or_at_the_end() {
        assert!(parse_gate_expr("(1 +\n 2)").is_ok());
        assert!(parse_gate_expr("1 + 2\n").is_ok());
        assert!(parse_gate_expr("1 +\n 2").is_err());
        assert!(parse_gate_expr("1 + \\\n 2").is_ok());
        assert!(!is_gate_expr("q\n    q.attach_task(parent)", GateDir::Input));
    }

    #[test]
    fn trailing_continuations_are_stripped_for_the_wrapped_probe() {
        assert!(is_gate_expr(" 1 \\\n", GateDir::Output));
    }

    #[test]
    fn string_subscripts_and_keyword_arguments_are_accepted() {
        for exp in ["ports['rx']", "f(x=1)", r#"names[b"tx" 'q']"#, r"lookup(r'a\b', key=i+1)"] {
            assert!(is_gate_expr(exp, GateDir::Output), "output {exp:?}");
            assert!(is_gate_expr(exp, GateDir::Input), "input {exp:?}");
        }
    }

    #[test]
    fn assignments_and_broken_strings_are_rejected() {
        assert!(!is_gate_expr("x = 'a'", GateDir::Output));
        assert!(!is_gate_expr("f(x == 1)", GateDir::Output));
        assert!(parse_gate_expr("'open").is_err());
        assert!(parse_gate_expr("'a\nb'").is_err());
        assert!(parse_gate_expr("'''a\nb'''").is_ok());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(parse_gate_expr("3abc").is_err());
        assert!(parse_gate_expr("1e").is_err());
        assert!(parse_gate_expr("0x").is_err());
        assert!(parse_gate_expr("1.5e-3").is_ok());
    }
}

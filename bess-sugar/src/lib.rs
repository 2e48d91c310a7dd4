pub mod arrows;
pub mod double_colon;
pub mod env_macro;
pub mod gate_expr;
pub mod source_map;
pub mod tokenizer;

pub use arrows::{ARROW, ArrowPosition, SEGMENT_SEPARATOR, find_arrows, replace_arrows};
pub use double_colon::replace_double_colon;
pub use env_macro::replace_env_macros;
pub use gate_expr::{GateDir, GateParseError, is_gate_expr, parse_gate_expr};
pub use source_map::{SourceText, SugarRows, char_col_to_byte, split_lines};
pub use tokenizer::{LexError, Token, TokenKind, Tokenized, tokenize};

use tracing::debug;

/// Text with all pipeline sugar removed, plus the bookkeeping needed to map
/// results on it back onto the original script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Desugared {
    pub text: String,
    pub sugar_rows: SugarRows,
    pub arrows: Vec<ArrowPosition>,
}

pub fn desugar(source: &str) -> Desugared {
    let expanded = replace_env_macros(source);
    let (text, mut sugar_rows) = replace_double_colon(&expanded);
    let (text, arrows) = replace_arrows(&text);
    sugar_rows.extend(arrows.iter().map(|arrow| arrow.row));
    debug!(
        arrows = arrows.len(),
        rows = sugar_rows.len(),
        "desugared pipeline script"
    );
    Desugared {
        text,
        sugar_rows,
        arrows,
    }
}

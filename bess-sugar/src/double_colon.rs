use std::sync::OnceLock;

use regex::Regex;

use crate::source_map::{SugarRows, split_lines};

pub const DOUBLE_COLON_REPLACEMENT: &str = "= ";

static DOUBLE_COLON: OnceLock<Regex> = OnceLock::new();

fn double_colon() -> &'static Regex {
    DOUBLE_COLON.get_or_init(|| Regex::new("::").expect("static pattern should be valid"))
}

/// Rewrites the `name::Module()` assignment sugar into `name= Module()` and
/// reports the rows that changed. Columns after a substitution are not
/// corrected; only the row is recorded.
pub fn replace_double_colon(source: &str) -> (String, SugarRows) {
    let pattern = double_colon();
    let mut text = String::with_capacity(source.len());
    let mut rows = SugarRows::new();
    for (row, line) in split_lines(source).into_iter().enumerate() {
        if pattern.is_match(line) {
            rows.mark(row);
            text.push_str(&pattern.replace_all(line, DOUBLE_COLON_REPLACEMENT));
        } else {
            text.push_str(line);
        }
    }
    (text, rows)
}

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

static ENV_MACRO: OnceLock<Regex> = OnceLock::new();

fn env_macro() -> &'static Regex {
    ENV_MACRO.get_or_init(|| Regex::new(r"\$\w(\w*)!").expect("static pattern should be valid"))
}

/// Rewrites `$NAME!` environment macros into `'AME'+`.
///
/// The replacement has exactly as many characters as the macro, so columns
/// on the line stay exact and the row is not reported as touched.
pub fn replace_env_macros(source: &str) -> Cow<'_, str> {
    env_macro().replace_all(source, "'${1}'+")
}

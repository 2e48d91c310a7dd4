use lsp_types::Diagnostic;
use regex::Regex;

use crate::document::Rewritten;

/// Codes a rewrite may provoke on the line it touched, per linter.
const SUGAR_ARTIFACTS: &[(&str, &[&str])] = &[("pycodestyle", &["E203", "E225", "E231", "E702"])];

/// Messages caused by the injected star import, reported anywhere in a document.
const HEADER_ARTIFACTS: &[(&str, &[&str])] = &[(
    "pyflakes",
    &[
        r"import \*' used; unable to detect undefined names",
        r"may be undefined, or defined from star imports",
    ],
)];

#[derive(Debug)]
struct Rule {
    source: &'static str,
    pattern: Regex,
}

impl Rule {
    fn matches(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.source.as_deref() == Some(self.source)
            && self.pattern.is_match(&diagnostic.message)
    }
}

/// Drops diagnostics that only exist because of the rewrite and moves the
/// rest back to user rows.
#[derive(Debug)]
pub struct LintFilter {
    sugar_rules: Vec<Rule>,
    header_rules: Vec<Rule>,
}

impl LintFilter {
    pub fn new() -> Self {
        let sugar_rules = SUGAR_ARTIFACTS
            .iter()
            .map(|&(source, codes)| Rule {
                source,
                pattern: Regex::new(&format!(r"^({})\b", codes.join("|")))
                    .expect("lint code pattern should be valid"),
            })
            .collect();
        let header_rules = HEADER_ARTIFACTS
            .iter()
            .map(|&(source, messages)| Rule {
                source,
                pattern: Regex::new(&messages.join("|"))
                    .expect("lint message pattern should be valid"),
            })
            .collect();
        Self {
            sugar_rules,
            header_rules,
        }
    }

    /// Whether a diagnostic in backend coordinates survives.
    pub fn keep(&self, diagnostic: &Diagnostic, rewritten: &Rewritten) -> bool {
        if self.header_rules.iter().any(|rule| rule.matches(diagnostic)) {
            return false;
        }
        let row = diagnostic.range.start.line as usize;
        !(rewritten.sugar_rows.contains(row)
            && self.sugar_rules.iter().any(|rule| rule.matches(diagnostic)))
    }

    pub fn apply(&self, diagnostics: Vec<Diagnostic>, rewritten: &Rewritten) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|diagnostic| self.keep(diagnostic, rewritten))
            .filter_map(|mut diagnostic| {
                diagnostic.range = rewritten.offset.range_from_backend(diagnostic.range)?;
                Some(diagnostic)
            })
            .collect()
    }
}

impl Default for LintFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use lsp_types::{Position, Range};

    use super::*;

    fn diagnostic(source: &str, row: u32, message: &str) -> Diagnostic {
        Diagnostic {
            range: Range::new(Position::new(row, 0), Position::new(row, 1)),
            source: Some(source.to_string()),
            message: message.to_string(),
            ..Diagnostic::default()
        }
    }

    #[test]
    fn sugar_row_artifacts_are_dropped_elsewhere_kept() {
        let rewritten = Rewritten::from_source("a = 1\nb -> c\n");
        let filter = LintFilter::new();
        let kept = filter.apply(
            vec![
                diagnostic("pycodestyle", 2, "E702 multiple statements on one line"),
                diagnostic("pycodestyle", 1, "E225 missing whitespace around operator"),
                diagnostic("pycodestyle", 2, "E501 line too long"),
                diagnostic("pyflakes", 2, "E702-like text from another tool"),
            ],
            &rewritten,
        );
        let summary: Vec<(u32, &str)> = kept
            .iter()
            .map(|d| (d.range.start.line, d.message.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "E225 missing whitespace around operator"),
                (1, "E501 line too long"),
                (1, "E702-like text from another tool"),
            ]
        );
    }

    #[test]
    fn code_prefix_needs_word_boundary() {
        let rewritten = Rewritten::from_source("b -> c\n");
        let filter = LintFilter::new();
        let kept = filter.apply(vec![diagnostic("pycodestyle", 1, "E2031 custom")], &rewritten);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn star_import_noise_is_dropped_on_every_row() {
        let rewritten = Rewritten::from_source("x = Queue()\n");
        let filter = LintFilter::new();
        let kept = filter.apply(
            vec![
                diagnostic(
                    "pyflakes",
                    0,
                    "'from pyls_bess.bess_doc.globals import *' used; unable to detect undefined names",
                ),
                diagnostic(
                    "pyflakes",
                    1,
                    "'Queue' may be undefined, or defined from star imports: pyls_bess.bess_doc.globals",
                ),
                diagnostic("pyflakes", 1, "undefined name 'y'"),
            ],
            &rewritten,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].range.start.line, 0);
    }
}

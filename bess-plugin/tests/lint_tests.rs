mod common;
use common::*;

use lsp_types::{Diagnostic, Position};

fn diagnostic(source: &str, line: u32, message: &str) -> Diagnostic {
    Diagnostic {
        range: range_on(line, 0, 2),
        source: Some(source.to_string()),
        message: message.to_string(),
        ..Diagnostic::default()
    }
}

const SCRIPT: &str = "q::Queue()\nsrc -> q\nx = 1\n";

#[test]
fn rewrite_artifacts_are_filtered_and_rows_restored() {
    let schema_dir = tempfile::tempdir().expect("tempdir should be created");
    let source_dir = tempfile::tempdir().expect("tempdir should be created");
    let inner = FakeBackend {
        diagnostics: vec![
            diagnostic(
                "pyflakes",
                0,
                "'from pyls_bess.bess_doc.globals import *' used; unable to detect undefined names",
            ),
            diagnostic("pycodestyle", 1, "E225 missing whitespace around operator"),
            diagnostic("pycodestyle", 2, "E702 multiple statements on one line (semicolon)"),
            diagnostic("pycodestyle", 3, "E225 missing whitespace around operator"),
            diagnostic("pyflakes", 3, "undefined name 'zz'"),
        ],
        ..FakeBackend::default()
    };
    let (backend, _) = sugared(inner, schema_dir.path(), source_dir.path(), serde_json::json!({}));

    let document = open_document("p.bess", SCRIPT);
    let kept = backend.lint(&document).expect("lint should not fail");
    let summary: Vec<(u32, String)> = kept
        .iter()
        .map(|d| (d.range.start.line, d.message.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (2, "E225 missing whitespace around operator".to_string()),
            (2, "undefined name 'zz'".to_string()),
        ]
    );
    assert!(backend.inner().sources()[0].starts_with(HEADER_LINE));
}

#[test]
fn failing_backend_yields_empty_results_for_scripts() {
    let schema_dir = tempfile::tempdir().expect("tempdir should be created");
    let source_dir = tempfile::tempdir().expect("tempdir should be created");
    let inner = FakeBackend {
        fail: true,
        ..FakeBackend::default()
    };
    let (backend, _) = sugared(inner, schema_dir.path(), source_dir.path(), serde_json::json!({}));
    let document = open_document("p.bess", SCRIPT);

    assert!(backend.lint(&document).expect("lint is swallowed").is_empty());
    assert!(
        backend
            .definitions(&document, Position::new(1, 0))
            .expect("definitions are swallowed")
            .is_empty()
    );
    assert!(
        backend
            .references(&document, Position::new(1, 0), false)
            .expect("references are swallowed")
            .is_empty()
    );
    assert!(
        backend
            .document_highlight(&document, Position::new(1, 0))
            .expect("highlights are swallowed")
            .is_empty()
    );
}

#[test]
fn host_documents_lint_unchanged() {
    let schema_dir = tempfile::tempdir().expect("tempdir should be created");
    let source_dir = tempfile::tempdir().expect("tempdir should be created");
    let inner = FakeBackend {
        diagnostics: vec![diagnostic("pycodestyle", 1, "E225 missing whitespace around operator")],
        ..FakeBackend::default()
    };
    let (backend, _) = sugared(inner, schema_dir.path(), source_dir.path(), serde_json::json!({}));
    let document = open_document("lib.py", "a = 1\nb=2\n");

    let kept = backend.lint(&document).expect("lint should not fail");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].range.start.line, 1);
}

#[test]
fn host_lint_errors_pass_through() {
    let schema_dir = tempfile::tempdir().expect("tempdir should be created");
    let source_dir = tempfile::tempdir().expect("tempdir should be created");
    let inner = FakeBackend {
        fail: true,
        ..FakeBackend::default()
    };
    let (backend, _) = sugared(inner, schema_dir.path(), source_dir.path(), serde_json::json!({}));
    let document = open_document("lib.py", "a = 1\n");
    let err = backend.lint(&document).expect_err("host lint errors are not swallowed");
    assert_eq!(err.message, "backend crashed");
}

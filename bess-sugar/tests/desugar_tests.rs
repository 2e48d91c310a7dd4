mod common;
use common::*;

#[test]
fn double_colon_marks_only_touched_rows() {
    let source = "q::Queue()\nx = 1\n";
    let (text, rows) = replace_double_colon(source);
    assert_eq!(text, "q= Queue()\nx = 1\n");
    assert!(rows.contains(0));
    assert!(!rows.contains(1));
    assert_eq!(lines(&text)[1], lines(source)[1]);
}

#[test]
fn desugar_combines_all_rewrites() {
    let source = "src::Source()\nsrc:1 -> q::Queue()\nport = $BESS_PORT!'80'\n";
    let rewritten = desugar(source);
    assert_eq!(
        rewritten.text,
        "src= Source()\nsrc,1 ;  q= Queue()\nport = 'ESS_PORT'+'80'\n"
    );
    assert_eq!(rewritten.sugar_rows.iter().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(rewritten.arrows, vec![ArrowPosition::new(1, 6)]);
}

#[test]
fn desugar_of_plain_host_code_is_identity() {
    let source = "import os\n\ndef f(x):\n    return {'a': x[1:]}\n";
    let rewritten = desugar(source);
    assert_eq!(rewritten.text, source);
    assert!(rewritten.sugar_rows.is_empty());
    assert!(rewritten.arrows.is_empty());
}

#[test]
fn round_robin_script_marks_arrow_rows() {
    let rewritten = desugar(ROUND_ROBIN_SCRIPT);
    assert_eq!(
        rewritten.sugar_rows.iter().collect::<Vec<_>>(),
        vec![3, 14, 16]
    );
    assert_eq!(
        changed_rows(ROUND_ROBIN_SCRIPT, &rewritten.text),
        vec![3, 14, 16]
    );
}

#![allow(dead_code, unused_imports)]

pub use sugar::{
    ArrowPosition, Desugared, GateDir, LexError, SugarRows, TokenKind, desugar, find_arrows,
    is_gate_expr, replace_arrows, replace_double_colon, replace_env_macros, tokenize,
};

pub const ROUND_ROBIN_SCRIPT: &str = r#"
bess.add_tc('main', policy='weighted_fair', resource='bit')

src = Source() -> rr= RoundRobin(gates=[1, 2])

for j in range(i):
    name = 'w_%2s' % j
    bess.add_tc(name,
                parent='main',
                policy='round_robin',
                share=j+1)
    q = Queue()
    q.set_size(size=32)
    q.get_status()['dequeued']
    rr:j->q
    q.attach_task(parent=name)
    q -> Sink()
"#;

pub fn lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Rows whose text differs between two documents of equal line count.
pub fn changed_rows(before: &str, after: &str) -> Vec<usize> {
    let before = lines(before);
    let after = lines(after);
    assert_eq!(before.len(), after.len(), "rewrite must keep the line count");
    before
        .iter()
        .zip(after.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(row, _)| row)
        .collect()
}

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness; honours `RUST_LOG`.
/// Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// `n` tokens under the heuristic tokenizer: "abcd abcd abcd ...".
pub fn words(n: usize) -> String {
    vec!["abcd"; n].join(" ")
}

//! dashfilter CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Initializes logging to stderr
//! 2. Parses and dispatches CLI commands (via cli::run)
//! 3. Prints errors to stderr
//! 4. Exits with non-zero on failure

use dashfilter::cli;

/// Environment variable holding the log filter
const ENV_LOG: &str = "DASHFILTER_LOG";

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn main() {
    init_logging();

    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}

//! Tracing subscriber setup
//!
//! Logs go to stderr so that `export` output on stdout stays clean CSV.
//! `RUST_LOG` overrides the level passed on the command line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        let layer = fmt::layer()
            .json()
            .with_target(true) // Keep target in JSON for structured queries
            .with_writer(std::io::stderr)
            .with_ansi(false);
        registry.with(layer).init();
    } else {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        registry.with(layer).init();
    }
}

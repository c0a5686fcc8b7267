//! Diagnostic logging to stderr
//!
//! `RUST_LOG` wins when set; otherwise warnings only, or debug output for
//! the warehub crates with `--debug`. Command output stays on stdout.

use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "warn,warehub=debug,warehub_core=debug,warehub_repo=debug,warehub_engine=debug";

pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Log setup for the `dax` binary.
//!
//! Logs go to stderr so `--json` output on stdout stays parseable.
//! `RUST_LOG` takes precedence; otherwise `--verbose` selects `info` and the
//! default is `warn`.

use tracing_subscriber::EnvFilter;

pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    })
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

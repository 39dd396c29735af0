//! Common utilities for concord-cmd

use tracing_subscriber::EnvFilter;

/// Installs a compact stderr logger; stdout is reserved for JSON output.
///
/// `CONCORD_LOG` takes precedence over `RUST_LOG`; without either the level
/// follows the flags (`-v` debug, `-q` error, otherwise warn).
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = std::env::var("CONCORD_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level_for_flags(verbose, quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

/// `-v` wins over `-q` when both are given.
fn level_for_flags(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for_flags(true, true), "debug");
        assert_eq!(level_for_flags(false, true), "error");
        assert_eq!(level_for_flags(false, false), "warn");
    }
}

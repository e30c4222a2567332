//! Logging setup
//!
//! Diagnostics go through the `log` facade to stderr so stdout carries only
//! the report. `RUST_LOG` overrides the level chosen here.

use log::LevelFilter;

/// Initialize the global logger
///
/// Defaults to `warn`, or `info` when `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(default_level(verbose))
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .try_init()
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

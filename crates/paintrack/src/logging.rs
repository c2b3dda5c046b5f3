//! Logging configuration for paintrack.
//!
//! Installs the tracing subscriber used by the `paintrack` binary. The
//! filter is chosen in this order: `RUST_LOG`, then the `-q`/`-v` flags, then
//! `logging.level` from the config file, then `info`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Target that default filters apply to.
const CRATE_TARGET: &str = "paintrack";

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// No flag given; the configured level applies.
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Filter directive used when `RUST_LOG` is unset.
///
/// Explicit `-q`/`-v` flags win over the configured level.
#[must_use]
pub fn default_directive(verbosity: Verbosity, configured: Option<Level>) -> String {
    let level = match (verbosity, configured) {
        (Verbosity::Normal, Some(level)) => level,
        _ => verbosity.to_level_filter(),
    };
    format!("{CRATE_TARGET}={level}")
}

/// Initialize the logging system.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// # Examples
///
/// ```no_run
/// use paintrack::config::LoggingConfig;
/// use paintrack::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose, &LoggingConfig::default());
/// ```
pub fn init_logging(verbosity: Verbosity, config: &LoggingConfig) {
    let directive = default_directive(verbosity, config.level());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_targets)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
///
/// Only warnings and errors, written through the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

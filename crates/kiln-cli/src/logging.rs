//! Tracing subscriber setup
//!
//! Log records go to stderr so JSON written to stdout stays parseable.
//! `KILN_LOG` takes precedence over `RUST_LOG`; both take precedence over
//! `--log-level` and `-v`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable holding tracing filter directives
pub const LOG_ENV: &str = "KILN_LOG";

const CRATES: &[&str] = &["kiln", "kiln_descriptor", "kiln_config", "kiln_syntax"];

/// CLI log level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogLevel {
    /// Only error conditions
    #[default]
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and informational messages
    Info,
    /// All above plus debug information
    Debug,
    /// All above plus detailed tracing
    Trace,
}

impl LogLevel {
    /// Level `steps` notches more verbose, saturating at trace
    pub fn raised(self, steps: u8) -> Self {
        let order = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let current = order.iter().position(|l| *l == self).unwrap_or(0);
        order[(current + steps as usize).min(order.len() - 1)]
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Filter used when neither `KILN_LOG` nor `RUST_LOG` is set
fn default_directives(level: Level) -> String {
    let mut directives = vec!["error".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

pub fn init(level: LogLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level.into())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_saturates() {
        assert_eq!(LogLevel::Error.raised(0), LogLevel::Error);
        assert_eq!(LogLevel::Error.raised(2), LogLevel::Info);
        assert_eq!(LogLevel::Debug.raised(9), LogLevel::Trace);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "error,kiln=DEBUG,kiln_descriptor=DEBUG,kiln_config=DEBUG,kiln_syntax=DEBUG"
        );
    }
}

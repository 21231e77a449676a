use core::str::FromStr;

use thiserror::Error;

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "ESTOQUE_LOG_FORMAT";

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

const DEFAULT_FILTER: &str = "info";

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown log format: {0}")]
pub struct ParseLogFormatError(String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ParseLogFormatError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Read `ESTOQUE_LOG_FORMAT` and `RUST_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// Unknown formats fall back to JSON; a blank filter falls back to `info`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = lookup(LOG_FORMAT_ENV)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let filter = lookup(LOG_FILTER_ENV)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self { format, filter }
    }
}

//! Log subscriber setup.
//!
//! `RUST_LOG`, when set, takes precedence over the configured level.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,

    /// Multi-line, human-readable.
    Pretty,

    /// Newline-delimited JSON.
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,

    /// Directive string such as `iqcal_instruments=debug,info`. Overrides `level`.
    pub filter: Option<String>,
}

impl LogSettings {
    /// The filter the subscriber is installed with.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured directive string does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives)
                .with_context(|| format!("invalid log filter {directives:?}")),
            None => Ok(EnvFilter::new(self.level.as_str())),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays clean for results.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already installed.
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = settings.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_writer(std::io::stderr);

    match settings.format {
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    }
    .context("failed to install log subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_match_filter_directives() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert!(EnvFilter::try_new(level.as_str()).is_ok());
        }
    }

    #[test]
    fn invalid_filter_is_reported() {
        let settings = LogSettings {
            filter: Some("iqcal=notalevel".into()),
            ..LogSettings::default()
        };

        // RUST_LOG would bypass the configured filter.
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(settings.env_filter().is_err());
        }
    }
}

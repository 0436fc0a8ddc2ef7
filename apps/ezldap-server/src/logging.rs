//! Tracing subscriber setup.
//!
//! JSON lines for production, human-readable text for local runs. The
//! format and default filter come from [`ServerConfig`](crate::config::ServerConfig);
//! `RUST_LOG` overrides the filter.

use std::fmt as stdfmt;
use std::str::FromStr;

use tracing_subscriber::{
    filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Filter used when neither `RUST_LOG` nor `EZLDAP_LOG_FILTER` is set.
pub const DEFAULT_FILTER: &str = "info,ezldap_core=debug,ezldap_cache=debug,ezldap_connector_ldap=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Multi-field text for terminals.
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}', expected json or text")),
        }
    }
}

impl stdfmt::Display for LogFormat {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        })
    }
}

/// Pick the filter directives: `RUST_LOG` wins over the configured ones.
pub fn build_filter(rust_log: Option<&str>, configured: &str) -> Result<EnvFilter, ParseError> {
    match rust_log.filter(|v| !v.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(configured),
    }
}

/// Install the global subscriber.
///
/// Exits the process when the filter does not parse.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(format: LogFormat, filter: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter_layer = match build_filter(rust_log.as_deref(), filter) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("FATAL: invalid log filter: {e}");
            std::process::exit(1);
        }
    };

    let registry = tracing_subscriber::registry().with(filter_layer);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
    }

    tracing::info!(%format, filter = %filter, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_valid() {
        assert!(build_filter(None, DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_rust_log_takes_precedence() {
        let filter = build_filter(Some("warn"), "not a [valid filter").unwrap();
        assert_eq!(filter.to_string(), "warn");

        let filter = build_filter(Some("  "), "ezldap_core=trace").unwrap();
        assert_eq!(filter.to_string(), "ezldap_core=trace");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        assert!(build_filter(None, "ezldap_core=[").is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "json");
    }
}

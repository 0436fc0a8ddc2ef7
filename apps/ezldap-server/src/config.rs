//! Server configuration loaded from `EZLDAP_*` environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use ezldap_api::CorsConfig;
use ezldap_cache::config::MAX_TTL_SECS;
use ezldap_cache::CacheConfig;
use ezldap_connector_ldap::LdapConfig;

use crate::logging::{LogFormat, DEFAULT_FILTER};

/// Configuration for the ezldap HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address for the HTTP server.
    pub listen_addr: SocketAddr,

    /// Prefix in front of `/v1/ldap`, e.g. `/ezldap/api`.
    pub api_path: String,

    /// Directory connection settings.
    pub ldap: LdapConfig,

    /// Lookup cache settings, `None` when caching is disabled.
    pub cache: Option<CacheConfig>,

    /// Cross-origin settings for the lookup routes.
    pub cors: CorsConfig,

    /// Log output format.
    pub log_format: LogFormat,

    /// Log filter directives, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Tests supply variables this way without touching the process
    /// environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let listen_addr: SocketAddr =
            parse_or(&reader, "EZLDAP_LISTEN_ADDR", "0.0.0.0:8080".parse().ok())?;
        let api_path = reader("EZLDAP_API_PATH").unwrap_or_default();

        let url = required(&reader, "EZLDAP_LDAP_URL")?;
        let user_search_base = required(&reader, "EZLDAP_LDAP_USER_SEARCH_BASE")?;
        let ou_search_base = required(&reader, "EZLDAP_LDAP_OU_SEARCH_BASE")?;

        let mut ldap = LdapConfig::new(url, user_search_base, ou_search_base);
        ldap.bind_dn = optional(&reader, "EZLDAP_LDAP_USER_DN");
        ldap.bind_password = optional(&reader, "EZLDAP_LDAP_PASSWORD");
        ldap.use_starttls = parse_or(&reader, "EZLDAP_LDAP_STARTTLS", Some(false))?;
        ldap.connection_timeout_secs = parse_or(
            &reader,
            "EZLDAP_LDAP_CONNECT_TIMEOUT_SECS",
            Some(ldap.connection_timeout_secs),
        )?;
        ldap.operation_timeout_secs = parse_or(
            &reader,
            "EZLDAP_LDAP_OPERATION_TIMEOUT_SECS",
            Some(ldap.operation_timeout_secs),
        )?;
        ldap.validate().map_err(|e| ConfigError::InvalidValue {
            var: "EZLDAP_LDAP_*".to_string(),
            message: e.to_string(),
        })?;

        let cache_enabled = parse_or(&reader, "EZLDAP_CACHE_ENABLED", Some(true))?;
        let cache = if cache_enabled {
            let defaults = CacheConfig::default();
            let ttl_secs = parse_or(
                &reader,
                "EZLDAP_CACHE_TTL_SECS",
                Some(defaults.ttl.as_secs()),
            )?;
            if ttl_secs > MAX_TTL_SECS {
                return Err(ConfigError::InvalidValue {
                    var: "EZLDAP_CACHE_TTL_SECS".to_string(),
                    message: format!("must not exceed {MAX_TTL_SECS} seconds"),
                });
            }
            let max_capacity = parse_or(
                &reader,
                "EZLDAP_CACHE_MAX_CAPACITY",
                Some(defaults.max_capacity),
            )?;
            Some(CacheConfig::new(Duration::from_secs(ttl_secs), max_capacity))
        } else {
            None
        };

        let cors = CorsConfig {
            enabled: parse_or(&reader, "EZLDAP_CORS_ENABLED", Some(true))?,
            allowed_origin_patterns: origin_patterns(&reader)?,
        };

        let log_format = parse_or(&reader, "EZLDAP_LOG_FORMAT", Some(LogFormat::Json))?;
        let log_filter =
            optional(&reader, "EZLDAP_LOG_FILTER").unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Ok(Self {
            listen_addr,
            api_path,
            ldap,
            cache,
            cors,
            log_format,
            log_filter,
        })
    }
}

/// Comma-separated origin patterns from `EZLDAP_CORS_ALLOWED_ORIGINS`.
fn origin_patterns<F>(reader: &F) -> Result<Vec<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let var = "EZLDAP_CORS_ALLOWED_ORIGINS";
    let patterns: Vec<String> = optional(reader, var)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if let Some(bad) = patterns
        .iter()
        .find(|p| *p != "*" && !p.starts_with("http://") && !p.starts_with("https://"))
    {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: format!("origin pattern '{bad}' must start with http:// or https://"),
        });
    }
    Ok(patterns)
}

fn required<F>(reader: &F, var: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    optional(reader, var).ok_or_else(|| ConfigError::MissingVar(var.to_string()))
}

/// Non-empty value of `var`.
fn optional<F>(reader: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    reader(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(reader: &F, var: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(reader, var) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            message: e.to_string(),
        }),
        None => default.ok_or_else(|| ConfigError::MissingVar(var.to_string())),
    }
}

/// Configuration errors that can occur during environment loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

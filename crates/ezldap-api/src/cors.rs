//! Cross-origin access to the lookup routes.
//!
//! Origins are matched against patterns: `*` matches any run of characters
//! and a trailing `:[*]` matches any port or none, e.g.
//! `https://*.example.org` or `http://localhost:[*]`.

use std::time::Duration;

use axum::http::{header, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(1800);

/// CORS settings for the lookup routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Whether CORS headers are emitted at all.
    pub enabled: bool,

    /// Allowed origin patterns. Empty means no cross-origin access.
    pub allowed_origin_patterns: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origin_patterns: Vec::new(),
        }
    }
}

impl CorsConfig {
    /// Enabled config with the given patterns.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            allowed_origin_patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `origin` matches one of the allowed patterns.
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origin_patterns
            .iter()
            .any(|pattern| origin_matches(pattern, origin))
    }

    /// Layer for the lookup routes, `None` when CORS is off or no pattern
    /// is configured.
    pub fn layer(&self) -> Option<CorsLayer> {
        if !self.enabled || self.allowed_origin_patterns.is_empty() {
            return None;
        }

        let config = self.clone();
        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            let origin = origin.to_str().unwrap_or_default();
            let allowed = config.allows(origin);
            if !allowed {
                tracing::debug!(origin = %origin, "CORS origin rejected");
            }
            allowed
        });

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
                .max_age(PREFLIGHT_MAX_AGE),
        )
    }
}

fn origin_matches(pattern: &str, origin: &str) -> bool {
    let pattern = pattern.trim();
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix(":[*]") {
        Some(host) => {
            glob_match(host, origin)
                || origin.rsplit_once(':').is_some_and(|(rest, port)| {
                    !port.is_empty()
                        && port.bytes().all(|b| b.is_ascii_digit())
                        && glob_match(host, rest)
                })
        }
        None => glob_match(pattern, origin),
    }
}

/// Case-insensitive match where `*` stands for any run of characters.
fn glob_match(pattern: &str, value: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let value = value.to_ascii_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return pattern == value;
    };
    let Some(mut rest) = value.strip_prefix(first) else {
        return false;
    };
    for part in middle {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

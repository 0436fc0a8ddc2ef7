//! LDAP connection configuration

use serde::{Deserialize, Serialize};

use ezldap_core::error::{DirectoryError, DirectoryResult};

/// Configuration for [`LdapDirectory`](crate::LdapDirectory).
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Server URL (`ldap://host:389` or `ldaps://host:636`).
    pub url: String,

    /// Bind DN of the technical account. Anonymous when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Search base for persons (e.g. "o=users,dc=example,dc=org").
    pub user_search_base: String,

    /// Search base for OUs (e.g. "o=oubase,dc=example,dc=org").
    pub ou_search_base: String,

    /// Upgrade a plain connection with STARTTLS.
    #[serde(default)]
    pub use_starttls: bool,

    /// Connect timeout in seconds.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Timeout for a single bind or search in seconds.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user_search_base", &self.user_search_base)
            .field("ou_search_base", &self.ou_search_base)
            .field("use_starttls", &self.use_starttls)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

fn default_connection_timeout_secs() -> u64 {
    30
}

fn default_operation_timeout_secs() -> u64 {
    60
}

impl LdapConfig {
    /// Create a config for anonymous access.
    pub fn new(
        url: impl Into<String>,
        user_search_base: impl Into<String>,
        ou_search_base: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            bind_dn: None,
            bind_password: None,
            user_search_base: user_search_base.into(),
            ou_search_base: ou_search_base.into(),
            use_starttls: false,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }

    /// Bind with the given account.
    pub fn with_credentials(
        mut self,
        bind_dn: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self.bind_password = Some(password.into());
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connection_secs: u64, operation_secs: u64) -> Self {
        self.connection_timeout_secs = connection_secs;
        self.operation_timeout_secs = operation_secs;
        self
    }

    /// Whether the URL uses `ldaps://`.
    #[must_use]
    pub fn is_ldaps(&self) -> bool {
        self.url.to_ascii_lowercase().starts_with("ldaps://")
    }

    /// Check the configuration for obvious mistakes.
    pub fn validate(&self) -> DirectoryResult<()> {
        let lower = self.url.to_ascii_lowercase();
        if self.url.trim().is_empty() {
            return Err(invalid("url is required"));
        }
        if !(lower.starts_with("ldap://") || lower.starts_with("ldaps://")) {
            return Err(invalid(format!(
                "url must start with ldap:// or ldaps://, got '{}'",
                self.url
            )));
        }
        if self.user_search_base.trim().is_empty() {
            return Err(invalid("user_search_base is required"));
        }
        if self.ou_search_base.trim().is_empty() {
            return Err(invalid("ou_search_base is required"));
        }
        if self.use_starttls && self.is_ldaps() {
            return Err(invalid("cannot use both ldaps:// and STARTTLS"));
        }
        if self.bind_password.is_some() && self.bind_dn.is_none() {
            return Err(invalid("bind_password is set but bind_dn is missing"));
        }
        if self.connection_timeout_secs == 0 || self.operation_timeout_secs == 0 {
            return Err(invalid("timeouts must be at least one second"));
        }
        Ok(())
    }

    /// A copy with the password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}

fn invalid(message: impl Into<String>) -> DirectoryError {
    DirectoryError::InvalidConfiguration {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LdapConfig {
        LdapConfig::new(
            "ldap://ldap.example.org:389",
            "o=users,dc=example,dc=org",
            "o=oubase,dc=example,dc=org",
        )
    }

    #[test]
    fn test_ldap_config_new() {
        let config = config().with_credentials("cn=admin,dc=example,dc=org", "secret");

        assert_eq!(config.url, "ldap://ldap.example.org:389");
        assert_eq!(config.bind_dn.as_deref(), Some("cn=admin,dc=example,dc=org"));
        assert_eq!(config.bind_password.as_deref(), Some("secret"));
        assert_eq!(config.connection_timeout_secs, 30);
        assert_eq!(config.operation_timeout_secs, 60);
        assert!(!config.use_starttls);
    }

    #[test]
    fn test_ldap_config_validation() {
        assert!(config().validate().is_ok());
        assert!(config().with_starttls().validate().is_ok());

        let mut empty_url = config();
        empty_url.url = String::new();
        assert!(empty_url.validate().is_err());

        let mut http = config();
        http.url = "http://ldap.example.org".into();
        assert!(http.validate().is_err());

        let mut no_user_base = config();
        no_user_base.user_search_base = "  ".into();
        assert!(no_user_base.validate().is_err());

        let mut no_ou_base = config();
        no_ou_base.ou_search_base = String::new();
        assert!(no_ou_base.validate().is_err());

        let mut ldaps_and_starttls = config().with_starttls();
        ldaps_and_starttls.url = "LDAPS://ldap.example.org:636".into();
        assert!(ldaps_and_starttls.is_ldaps());
        assert!(ldaps_and_starttls.validate().is_err());

        let mut password_only = config();
        password_only.bind_password = Some("secret".into());
        assert!(password_only.validate().is_err());

        assert!(config().with_timeouts(0, 10).validate().is_err());
    }

    #[test]
    fn test_validation_error_kind() {
        let mut config = config();
        config.url = "ftp://x".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_ldap_config_redacted() {
        let config = config().with_credentials("cn=admin,dc=example,dc=org", "super-secret");

        let redacted = config.redacted();
        assert_eq!(redacted.bind_password.as_deref(), Some("***REDACTED***"));

        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***REDACTED***"));
    }

    #[test]
    fn test_ldap_config_deserialization_defaults() {
        let parsed: LdapConfig = serde_json::from_str(
            r#"{
                "url": "ldaps://ldap.example.org",
                "user_search_base": "o=users,dc=example,dc=org",
                "ou_search_base": "o=oubase,dc=example,dc=org"
            }"#,
        )
        .unwrap();

        assert!(parsed.is_ldaps());
        assert!(parsed.bind_dn.is_none());
        assert_eq!(parsed.connection_timeout_secs, 30);
        assert_eq!(parsed.operation_timeout_secs, 60);
    }
}

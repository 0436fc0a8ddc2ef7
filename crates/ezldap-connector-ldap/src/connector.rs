//! LDAP directory query port
//!
//! Implements [`DirectoryQueryPort`] on top of `ldap3`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, SearchEntry, SearchOptions};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use ezldap_core::error::{DirectoryError, DirectoryResult};
use ezldap_core::port::{DirectoryEntry, DirectoryQueryPort, Filter, Scope, SearchRequest};

use crate::config::LdapConfig;

/// Result code: success.
const RC_SUCCESS: u32 = 0;
/// Result code: more entries matched than the size limit allowed.
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;
/// Result code: the search base does not exist.
const RC_NO_SUCH_OBJECT: u32 = 32;
/// Result code: invalid bind credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP-backed directory.
///
/// Holds one multiplexed `ldap3` handle, created on first use and shared by
/// all concurrent searches. A transport failure drops the handle so the
/// next search reconnects.
pub struct LdapDirectory {
    config: LdapConfig,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectory {
    /// Create a directory for the given configuration. Does not connect.
    pub fn new(config: LdapConfig) -> DirectoryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Verify connectivity with a base search on the user search base.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> DirectoryResult<()> {
        let request = SearchRequest::new(&self.config.user_search_base, Filter::present("objectClass"))
            .with_scope(Scope::Object)
            .with_attributes(["1.1"]);
        let entries = self.search(request).await?;
        if entries.is_empty() {
            return Err(DirectoryError::connection_failed(format!(
                "User search base '{}' not accessible",
                self.config.user_search_base
            )));
        }
        info!("LDAP connection test successful");
        Ok(())
    }

    /// Unbind and drop the cached connection.
    pub async fn close(&self) {
        let mut guard = self.connection.write().await;
        if let Some(mut ldap) = guard.take() {
            if let Err(e) = ldap.unbind().await {
                warn!(error = %e, "Error during LDAP unbind");
            }
        }
    }

    fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.config.operation_timeout_secs)
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> DirectoryResult<Ldap> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let mut guard = self.connection.write().await;
        // Another task may have connected while we waited for the lock.
        if let Some(ref conn) = *guard {
            return Ok(conn.clone());
        }
        let conn = self.create_connection().await?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn invalidate_connection(&self) {
        *self.connection.write().await = None;
    }

    /// Create a new LDAP connection.
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let url = &self.config.url;
        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if let Some(bind_dn) = &self.config.bind_dn {
            let bind_password = self.config.bind_password.as_deref().unwrap_or("");
            debug!(bind_dn = %bind_dn, "Performing LDAP bind");

            let result = ldap
                .with_timeout(self.operation_timeout())
                .simple_bind(bind_dn, bind_password)
                .await
                .map_err(|e| self.map_ldap_error(format!("LDAP bind failed for {bind_dn}"), e))?;

            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(DirectoryError::connection_failed(format!(
                    "LDAP bind rejected for {bind_dn}: invalid credentials"
                )));
            }
            if result.rc != RC_SUCCESS {
                return Err(DirectoryError::connection_failed(format!(
                    "LDAP bind failed with code {}: {}",
                    result.rc, result.text
                )));
            }
        }

        info!(url = %url, "LDAP connection established successfully");
        Ok(ldap)
    }

    fn map_ldap_error(&self, message: String, error: LdapError) -> DirectoryError {
        match error {
            LdapError::Timeout { .. } => DirectoryError::Timeout {
                timeout_secs: self.config.operation_timeout_secs,
            },
            other => DirectoryError::connection_failed_with_source(message, other),
        }
    }

    /// Convert a filter to its RFC 4515 string form.
    pub fn filter_to_ldap(filter: &Filter) -> String {
        match filter {
            Filter::And { filters } => {
                let inner: Vec<String> = filters.iter().map(Self::filter_to_ldap).collect();
                format!("(&{})", inner.join(""))
            }
            Filter::Or { filters } => {
                let inner: Vec<String> = filters.iter().map(Self::filter_to_ldap).collect();
                format!("(|{})", inner.join(""))
            }
            Filter::Equals { attribute, value } => {
                format!("({}={})", attribute, Self::escape_ldap_value(value))
            }
            Filter::Like { attribute, pattern } => {
                format!("({}={})", attribute, Self::escape_ldap_pattern(pattern))
            }
            Filter::EndsWith { attribute, value } => {
                format!("({}=*{})", attribute, Self::escape_ldap_value(value))
            }
            Filter::GreaterOrEqual { attribute, value } => {
                format!("({}>={})", attribute, Self::escape_ldap_value(value))
            }
            Filter::Present { attribute } => {
                format!("({}=*)", attribute)
            }
        }
    }

    /// Escape special characters in LDAP filter values (RFC 4515).
    fn escape_ldap_value(value: &str) -> String {
        value
            .replace('\\', "\\5c")
            .replace('*', "\\2a")
            .replace('(', "\\28")
            .replace(')', "\\29")
            .replace('\0', "\\00")
    }

    /// Like [`escape_ldap_value`](Self::escape_ldap_value) but keeps `*` as
    /// a wildcard.
    fn escape_ldap_pattern(pattern: &str) -> String {
        pattern
            .split('*')
            .map(Self::escape_ldap_value)
            .collect::<Vec<_>>()
            .join("*")
    }

    fn to_ldap_scope(scope: Scope) -> ldap3::Scope {
        match scope {
            Scope::Object => ldap3::Scope::Base,
            Scope::OneLevel => ldap3::Scope::OneLevel,
            Scope::Subtree => ldap3::Scope::Subtree,
        }
    }

    /// Convert an `ldap3` entry to a directory entry.
    fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
        let mut result = DirectoryEntry::new(entry.dn);
        for (name, values) in entry.attrs {
            for value in values {
                result.push(&name, value);
            }
        }
        for (name, values) in entry.bin_attrs {
            for value in values {
                result = result.with_binary(&name, value);
            }
        }
        result
    }
}

#[async_trait]
impl DirectoryQueryPort for LdapDirectory {
    #[instrument(skip(self, request), fields(base = %request.base, scope = %request.scope))]
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        let mut ldap = self.get_connection().await?;

        let ldap_filter = Self::filter_to_ldap(&request.filter);
        let attrs: Vec<&str> = if request.attributes.is_empty() {
            vec!["*"]
        } else {
            request.attributes.iter().map(String::as_str).collect()
        };
        let size_limit = request
            .count_limit
            .map_or(0, |limit| i32::try_from(limit).unwrap_or(i32::MAX));

        debug!(filter = %ldap_filter, size_limit, "Searching LDAP");

        let result = ldap
            .with_search_options(SearchOptions::new().sizelimit(size_limit))
            .with_timeout(self.operation_timeout())
            .search(
                &request.base,
                Self::to_ldap_scope(request.scope),
                &ldap_filter,
                attrs,
            )
            .await;

        let ldap3::SearchResult(entries, outcome) = match result {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "LDAP search failed, dropping connection");
                self.invalidate_connection().await;
                return Err(match e {
                    LdapError::Timeout { .. } => DirectoryError::Timeout {
                        timeout_secs: self.config.operation_timeout_secs,
                    },
                    other => DirectoryError::operation_failed_with_source("LDAP search failed", other),
                });
            }
        };

        Self::check_outcome(&request, outcome.rc, &outcome.text, entries.len())?;

        let mut entries: Vec<DirectoryEntry> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(Self::to_directory_entry)
            .collect();
        if let Some(limit) = request.count_limit {
            entries.truncate(limit as usize);
        }

        debug!(returned = entries.len(), "LDAP search completed");
        Ok(entries)
    }
}

impl LdapDirectory {
    /// Map the search result code to success or a [`DirectoryError`].
    ///
    /// Size-limit overruns are plain truncation unless the request expects a
    /// unique match.
    fn check_outcome(
        request: &SearchRequest,
        rc: u32,
        text: &str,
        returned: usize,
    ) -> DirectoryResult<()> {
        let limit = request.count_limit.unwrap_or(u32::MAX);
        let overrun = rc == RC_SIZE_LIMIT_EXCEEDED
            || usize::try_from(limit).is_ok_and(|limit| returned > limit);
        match rc {
            RC_SUCCESS | RC_SIZE_LIMIT_EXCEEDED if request.unique && overrun => {
                debug!(limit, "Unique search matched more entries than allowed");
                Err(DirectoryError::SizeLimitExceeded { limit })
            }
            RC_SUCCESS | RC_SIZE_LIMIT_EXCEEDED => Ok(()),
            RC_NO_SUCH_OBJECT => Err(DirectoryError::name_not_found(&request.base)),
            rc => Err(DirectoryError::operation_failed(format!(
                "LDAP search failed with code {rc}: {text}"
            ))),
        }
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("config", &self.config.redacted())
            .finish()
    }
}

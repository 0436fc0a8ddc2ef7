//! # LDAP Connector
//!
//! [`DirectoryQueryPort`](ezldap_core::DirectoryQueryPort) backed by a real
//! LDAP server.
//!
//! ## Features
//!
//! - LDAP v3 over plain TCP, `ldaps://` or STARTTLS
//! - One multiplexed connection, reconnected after transport failures
//! - Server-side size limits and per-operation timeouts
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ezldap_connector_ldap::{LdapConfig, LdapDirectory};
//! use ezldap_core::LdapService;
//!
//! let config = LdapConfig::new(
//!     "ldap://ldap.example.org",
//!     "o=users,dc=example,dc=org",
//!     "o=oubase,dc=example,dc=org",
//! )
//! .with_credentials("cn=reader,dc=example,dc=org", "secret");
//!
//! let directory = LdapDirectory::new(config.clone())?;
//! directory.test_connection().await?;
//! let service = LdapService::new(
//!     Arc::new(directory),
//!     &config.user_search_base,
//!     &config.ou_search_base,
//! );
//! ```

pub mod config;
pub mod connector;

pub use config::LdapConfig;
pub use connector::LdapDirectory;

//! # ezldap core
//!
//! Read-only resolution of persons and organizational units (OUs) stored in
//! an LDAP directory.
//!
//! ## Features
//!
//! - Person lookup by object id or uid, wildcard uid search
//! - OU lookup by object id or short code, including leadership
//! - OU tree path derivation (short codes from the root down)
//! - OU subtree assembly with attached users
//!
//! The engine talks to the directory through [`DirectoryQueryPort`]. The
//! `ezldap-connector-ldap` crate provides the LDAP implementation,
//! [`memory::InMemoryDirectory`] an in-process one.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ezldap_core::{DirectoryService, LdapService};
//!
//! let service = LdapService::new(Arc::new(port), "o=users,dc=example,dc=org", "o=oubase,dc=example,dc=org");
//! let ou = service.find_ou_by_short_code("RBS-A-1").await?;
//! ```

pub mod dn;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod model;
pub mod port;
pub mod service;
pub mod tree;

pub use dn::{DistinguishedName, DnParseError};
pub use error::{AttributeError, DirectoryError, DirectoryResult, LdapServiceError, Result};
pub use mapper::AttributeSource;
pub use memory::InMemoryDirectory;
pub use model::{Address, BaseUser, Ou, OuSearchResult, User};
pub use port::{search_mapped, DirectoryEntry, DirectoryQueryPort, Filter, Scope, SearchRequest};
pub use service::{DirectoryService, LdapService, MAX_SEARCH_RESULTS};
pub use tree::OuTreeNode;

//! # Directory cache
//!
//! Time-bounded, single-flight caching in front of a
//! [`DirectoryService`](ezldap_core::DirectoryService).
//!
//! ```ignore
//! use ezldap_cache::{CacheConfig, CachingDirectoryService};
//!
//! let cached = CachingDirectoryService::new(service, CacheConfig::default());
//! let person = cached.get_person("20011").await?;
//! ```

pub mod config;
pub mod service;

pub use config::CacheConfig;
pub use service::CachingDirectoryService;

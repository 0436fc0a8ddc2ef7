//! # Directory REST API
//!
//! HTTP facade over a [`DirectoryService`](ezldap_core::DirectoryService).
//!
//! Hits answer `200` with `Cache-Control: max-age=600`, misses `404`,
//! rejected input `400` and directory failures `502`. Errors are RFC 7807
//! problem documents.

pub mod cors;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod router;

pub use cors::CorsConfig;
pub use error::{ApiError, ProblemDetails};
pub use openapi::{api_doc, ApiDoc};
pub use router::{api_router, ldap_router, mount_path, ApiState};

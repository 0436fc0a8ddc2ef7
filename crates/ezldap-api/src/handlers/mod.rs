//! HTTP handlers for the directory REST API.

pub mod health;
pub mod ous;
pub mod persons;

pub use health::health_handler;
pub use ous::{find_ou_by_short_code_handler, get_ou_handler, ou_tree_by_short_code_handler};
pub use persons::{
    find_persons_by_ou_handler, get_person_by_uid_handler, get_person_handler,
    ou_tree_by_user_handler, search_by_uid_handler,
};

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

/// Client cache lifetime for successful lookups.
pub const CACHE_CONTROL_VALUE: &str = "max-age=600";

/// JSON response that clients may cache.
fn cacheable<T: Serialize>(value: T) -> Response {
    ([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(value)).into_response()
}

/// Cacheable response for a hit, 404 for a miss.
fn found<T: Serialize>(value: Option<T>, kind: &'static str) -> Result<Response, ApiError> {
    value.map(cacheable).ok_or(ApiError::NotFound(kind))
}

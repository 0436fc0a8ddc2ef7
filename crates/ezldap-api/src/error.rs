//! Error types for the directory REST API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ezldap_core::LdapServiceError;

/// Error type for the directory REST API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested person or OU does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The engine rejected the request or the directory failed.
    #[error(transparent)]
    Service(#[from] LdapServiceError),
}

/// RFC 7807 Problem Details response format.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ProblemDetails {
    fn new(status: StatusCode, slug: &str, detail: String, code: Option<&str>) -> Self {
        Self {
            problem_type: format!("/problems/{slug}"),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: Some(detail),
            code: code.map(str::to_string),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, problem) = match &self {
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                ProblemDetails::new(StatusCode::NOT_FOUND, "not-found", self.to_string(), None),
            ),
            ApiError::Service(err @ LdapServiceError::InvalidArgument(msg)) => (
                StatusCode::BAD_REQUEST,
                ProblemDetails::new(
                    StatusCode::BAD_REQUEST,
                    "invalid-argument",
                    msg.clone(),
                    Some(err.error_code()),
                ),
            ),
            ApiError::Service(err @ LdapServiceError::Directory(inner)) => {
                tracing::error!(error = %inner, code = err.error_code(), "Directory request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ProblemDetails::new(
                        StatusCode::BAD_GATEWAY,
                        "directory-unavailable",
                        "The directory could not answer the request".to_string(),
                        Some(err.error_code()),
                    ),
                )
            }
        };

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/problem+json")],
            Json(problem),
        )
            .into_response()
    }
}

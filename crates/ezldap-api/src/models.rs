//! Request and response models for the directory REST API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default result size for wildcard uid searches.
pub const DEFAULT_SEARCH_SIZE: u32 = 10;

/// Query for lookups by login name.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UidQuery {
    /// Login name.
    pub uid: String,
}

/// Query for wildcard uid searches.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UidSearchQuery {
    /// Search phrase; `*` matches any run of characters.
    pub uid: String,

    /// Maximum number of results (capped at 100).
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_SEARCH_SIZE
}

/// Query for lookups by OU short code.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OuQuery {
    /// OU short code, e.g. `RBS-A-1`.
    pub ou: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

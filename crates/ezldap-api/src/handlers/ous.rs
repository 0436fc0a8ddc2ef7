//! OU endpoints.
//!
//! - GET /ou/:object_id
//! - GET /ou/search/findByOu?ou=
//! - GET /outree/:ou_short_code

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use ezldap_core::Ou;

use super::found;
use crate::error::{ApiError, ProblemDetails};
use crate::models::OuQuery;
use crate::router::ApiState;

/// OU by object id, with leadership.
#[utoipa::path(
    get,
    path = "/ou/{object_id}",
    params(("object_id" = String, Path, description = "Object id of the OU")),
    responses(
        (status = 200, description = "OU found", body = Ou),
        (status = 404, description = "No such OU", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "OUs"
)]
pub async fn get_ou_handler(
    State(state): State<ApiState>,
    Path(object_id): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(object_id = %object_id, "Get OU");
    found(state.service.get_ou_by_id(&object_id).await?, "OU")
}

/// OU by short code, with leadership.
#[utoipa::path(
    get,
    path = "/ou/search/findByOu",
    params(OuQuery),
    responses(
        (status = 200, description = "OU found", body = Ou),
        (status = 404, description = "No such OU", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "OUs"
)]
pub async fn find_ou_by_short_code_handler(
    State(state): State<ApiState>,
    Query(query): Query<OuQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(ou = %query.ou, "Find OU by short code");
    found(state.service.find_ou_by_short_code(&query.ou).await?, "OU")
}

/// Short codes from the root OU down to the given OU.
#[utoipa::path(
    get,
    path = "/outree/{ou_short_code}",
    params(("ou_short_code" = String, Path, description = "OU short code, e.g. RBS-A-1")),
    responses(
        (status = 200, description = "OU path, root first", body = Vec<String>),
        (status = 404, description = "No such OU", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "OUs"
)]
pub async fn ou_tree_by_short_code_handler(
    State(state): State<ApiState>,
    Path(ou_short_code): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(ou = %ou_short_code, "Get OU tree of OU");
    found(
        state
            .service
            .find_ou_tree_by_ou_short_code(&ou_short_code)
            .await?,
        "OU",
    )
}

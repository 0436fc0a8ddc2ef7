//! Person endpoints.
//!
//! - GET /user/:object_id
//! - GET /user/outree/:object_id
//! - GET /search/findByUid?uid=
//! - GET /search/findByUidWildcard?uid=&size=
//! - GET /search/findByOu?ou=

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use ezldap_core::{BaseUser, User};

use super::{cacheable, found};
use crate::error::{ApiError, ProblemDetails};
use crate::models::{OuQuery, UidQuery, UidSearchQuery};
use crate::router::ApiState;

/// Person by object id.
#[utoipa::path(
    get,
    path = "/user/{object_id}",
    params(("object_id" = String, Path, description = "Object id of the person")),
    responses(
        (status = 200, description = "Person found", body = User),
        (status = 404, description = "No such person", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "Persons"
)]
pub async fn get_person_handler(
    State(state): State<ApiState>,
    Path(object_id): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(object_id = %object_id, "Get person");
    found(state.service.get_person(&object_id).await?, "Person")
}

/// Person by login name.
#[utoipa::path(
    get,
    path = "/search/findByUid",
    params(UidQuery),
    responses(
        (status = 200, description = "Person found", body = User),
        (status = 404, description = "No such person", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "Persons"
)]
pub async fn get_person_by_uid_handler(
    State(state): State<ApiState>,
    Query(query): Query<UidQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(uid = %query.uid, "Get person by uid");
    found(state.service.get_person_by_uid(&query.uid).await?, "Person")
}

/// Persons whose uid matches a wildcard phrase.
#[utoipa::path(
    get,
    path = "/search/findByUidWildcard",
    params(UidSearchQuery),
    responses(
        (status = 200, description = "Matching persons", body = Vec<BaseUser>),
        (status = 400, description = "Search phrase too short", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "Persons"
)]
pub async fn search_by_uid_handler(
    State(state): State<ApiState>,
    Query(query): Query<UidSearchQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(uid = %query.uid, size = query.size, "Search persons by uid");
    let persons = state
        .service
        .search_by_uid_prefix(&query.uid, query.size)
        .await?;
    Ok(cacheable(persons))
}

/// Members of an OU.
#[utoipa::path(
    get,
    path = "/search/findByOu",
    params(OuQuery),
    responses(
        (status = 200, description = "Members of the OU", body = Vec<BaseUser>),
        (status = 404, description = "No such OU", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "Persons"
)]
pub async fn find_persons_by_ou_handler(
    State(state): State<ApiState>,
    Query(query): Query<OuQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(ou = %query.ou, "Find persons by OU");
    found(
        state.service.find_persons_by_ou_short_code(&query.ou).await?,
        "OU",
    )
}

/// Short codes from the root OU down to the person's OU.
#[utoipa::path(
    get,
    path = "/user/outree/{object_id}",
    params(("object_id" = String, Path, description = "Object id of the person")),
    responses(
        (status = 200, description = "OU path, root first", body = Vec<String>),
        (status = 404, description = "No such person", body = ProblemDetails),
        (status = 502, description = "Directory unavailable", body = ProblemDetails),
    ),
    tag = "Persons"
)]
pub async fn ou_tree_by_user_handler(
    State(state): State<ApiState>,
    Path(object_id): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(object_id = %object_id, "Get OU tree of person");
    found(
        state.service.find_ou_tree_by_user_id(&object_id).await?,
        "Person",
    )
}

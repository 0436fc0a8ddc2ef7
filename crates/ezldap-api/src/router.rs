//! Directory REST API router configuration.
//!
//! Mounts the lookup routes below `{api_path}/v1/ldap`:
//! - GET /user/:object_id - Person by object id
//! - GET /user/outree/:object_id - OU path of a person
//! - GET /search/findByUid - Person by uid
//! - GET /search/findByUidWildcard - Wildcard uid search
//! - GET /search/findByOu - Members of an OU
//! - GET /ou/:object_id - OU by object id
//! - GET /ou/search/findByOu - OU by short code
//! - GET /outree/:ou_short_code - OU path of an OU
//!
//! `/health` and `/api-docs/openapi.json` are served at the root. CORS
//! headers are only added below the lookup mount point.

use std::sync::Arc;

use axum::{routing::get, Json, Router};

use ezldap_core::DirectoryService;

use crate::cors::CorsConfig;

use crate::handlers::{
    find_ou_by_short_code_handler, find_persons_by_ou_handler, get_ou_handler,
    get_person_by_uid_handler, get_person_handler, health_handler, ou_tree_by_short_code_handler,
    ou_tree_by_user_handler, search_by_uid_handler,
};
use crate::openapi::api_doc;

/// Application state for directory routes.
#[derive(Clone)]
pub struct ApiState {
    /// Resolution engine, possibly behind a cache.
    pub service: Arc<dyn DirectoryService>,
}

impl ApiState {
    /// Create a new state around the given service.
    pub fn new(service: Arc<dyn DirectoryService>) -> Self {
        Self { service }
    }
}

/// Lookup routes, relative to their mount point.
pub fn ldap_router(state: ApiState) -> Router {
    Router::new()
        .route("/user/:object_id", get(get_person_handler))
        .route("/user/outree/:object_id", get(ou_tree_by_user_handler))
        .route("/search/findByUid", get(get_person_by_uid_handler))
        .route("/search/findByUidWildcard", get(search_by_uid_handler))
        .route("/search/findByOu", get(find_persons_by_ou_handler))
        .route("/ou/:object_id", get(get_ou_handler))
        .route("/ou/search/findByOu", get(find_ou_by_short_code_handler))
        .route("/outree/:ou_short_code", get(ou_tree_by_short_code_handler))
        .with_state(state)
}

/// Full application router.
pub fn api_router(
    api_path: &str,
    service: Arc<dyn DirectoryService>,
    cors: &CorsConfig,
) -> Router {
    let mut lookups = ldap_router(ApiState::new(service));
    if let Some(layer) = cors.layer() {
        tracing::info!(
            mount = %mount_path(api_path),
            patterns = ?cors.allowed_origin_patterns,
            "CORS enabled for lookup routes"
        );
        lookups = lookups.layer(layer);
    }

    let doc = Arc::new(api_doc(api_path));
    Router::new()
        .nest(&mount_path(api_path), lookups)
        .route("/health", get(health_handler))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = Arc::clone(&doc);
                async move { Json(doc.as_ref().clone()) }
            }),
        )
}

/// `{api_path}/v1/ldap` with exactly one leading slash and no trailing one.
pub fn mount_path(api_path: &str) -> String {
    let prefix = api_path.trim_matches('/');
    if prefix.is_empty() {
        "/v1/ldap".to_string()
    } else {
        format!("/{prefix}/v1/ldap")
    }
}

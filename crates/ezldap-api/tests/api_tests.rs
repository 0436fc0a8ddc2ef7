//! Integration tests for the directory REST API.

use axum::http::{header, Method, StatusCode};
use ezldap_api::CorsConfig;
use ezldap_core::DirectoryError;

mod common;
use common::{create_test_app, create_test_app_with_cors, get_json, send_with_origin};

// =============================================================================
// Persons
// =============================================================================

#[tokio::test]
async fn test_get_person() {
    let (_, app) = create_test_app("");
    let (status, headers, body) = get_json(app, "/v1/ldap/user/20011").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=600");
    assert_eq!(body["uid"], "maxi.mustermann");
    assert_eq!(body["objectId"], "20011");
    assert_eq!(body["postalAddress"]["city"], "München");
}

#[tokio::test]
async fn test_get_person_not_found() {
    let (_, app) = create_test_app("");
    let (status, headers, body) = get_json(app, "/v1/ldap/user/00000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    assert!(headers.get(header::CACHE_CONTROL).is_none());
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_get_person_by_uid() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/v1/ldap/search/findByUid?uid=peter.lustig").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objectId"], "20013");
}

#[tokio::test]
async fn test_search_by_uid_wildcard() {
    let (_, app) = create_test_app("");
    let (status, _, body) =
        get_json(app, "/v1/ldap/search/findByUidWildcard?uid=*.mustermann").await;

    assert_eq!(status, StatusCode::OK);
    let mut uids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["uid"].as_str().unwrap())
        .collect();
    uids.sort();
    assert_eq!(uids, vec!["maxi.mustermann", "petra.mustermann"]);
}

#[tokio::test]
async fn test_search_by_uid_wildcard_respects_size() {
    let (_, app) = create_test_app("");
    let (status, _, body) =
        get_json(app, "/v1/ldap/search/findByUidWildcard?uid=pe*&size=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_by_uid_wildcard_phrase_too_short() {
    let (directory, app) = create_test_app("");
    let (status, headers, body) =
        get_json(app, "/v1/ldap/search/findByUidWildcard?uid=a*").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    assert_eq!(body["code"], "INVALID_ARGUMENT");
    assert_eq!(directory.search_count(), 0);
}

#[tokio::test]
async fn test_find_persons_by_ou() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/v1/ldap/search/findByOu?ou=RBS").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_find_persons_by_unknown_ou() {
    let (_, app) = create_test_app("");
    let (status, _, _) = get_json(app, "/v1/ldap/search/findByOu?ou=hammaned").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ou_tree_by_user() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/v1/ldap/user/outree/20011").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["LHM", "RBS", "RBS-A-1"]));
}

// =============================================================================
// OUs
// =============================================================================

#[tokio::test]
async fn test_get_ou() {
    let (_, app) = create_test_app("");
    let (status, headers, body) = get_json(app, "/v1/ldap/ou/30002").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=600");
    assert_eq!(body["ouShortName"], "RBS-A-1");
    assert_eq!(body["leadership"]["uid"], "maxi.mustermann");
    assert_eq!(body["deputyLeadership"]["uid"], "petra.mustermann");
}

#[tokio::test]
async fn test_find_ou_by_short_code() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/v1/ldap/ou/search/findByOu?ou=RBS-A-2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objectId"], "30003");
    assert_eq!(body["street"], "Bayerstraße 28\nEingang B");
}

#[tokio::test]
async fn test_ou_tree_by_short_code() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/v1/ldap/outree/RBS-A-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["LHM", "RBS", "RBS-A-1"]));
}

#[tokio::test]
async fn test_ou_tree_by_unknown_short_code() {
    let (_, app) = create_test_app("");
    let (status, _, _) = get_json(app, "/v1/ldap/outree/hammaned").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Failures and mounting
// =============================================================================

#[tokio::test]
async fn test_directory_failure_is_bad_gateway() {
    let (directory, app) = create_test_app("");
    directory.set_failure(Some(DirectoryError::connection_failed("server down")));

    let (status, headers, body) = get_json(app, "/v1/ldap/user/20011").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    assert_eq!(body["code"], "CONNECTION_FAILED");
    assert!(!body["detail"].as_str().unwrap().contains("server down"));
}

#[tokio::test]
async fn test_api_path_prefix() {
    let (_, app) = create_test_app("/ezldap/api");
    let (status, _, _) = get_json(app, "/ezldap/api/v1/ldap/user/20011").await;
    assert_eq!(status, StatusCode::OK);

    let (_, app) = create_test_app("/ezldap/api");
    let (status, _, _) = get_json(app, "/v1/ldap/user/20011").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (directory, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(directory.search_count(), 0);
}

#[tokio::test]
async fn test_openapi_document() {
    let (_, app) = create_test_app("");
    let (status, _, body) = get_json(app, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "ezldap API");
    assert!(body["paths"]["/v1/ldap/user/{object_id}"].is_object());
    assert!(body["paths"]["/health"].is_object());
}

#[tokio::test]
async fn test_openapi_document_with_api_path() {
    let (_, app) = create_test_app("/ezldap/api");
    let (status, _, body) = get_json(app, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/ezldap/api/v1/ldap/ou/search/findByOu"].is_object());
    assert!(body["paths"]["/ou/search/findByOu"].is_null());
}

// =============================================================================
// CORS
// =============================================================================

fn cors() -> CorsConfig {
    CorsConfig::with_patterns(["http://localhost:[*]", "https://*.example.org"])
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    for origin in ["http://localhost:8081", "https://app.example.org"] {
        let (_, app) = create_test_app_with_cors("", &cors());
        let (status, headers) =
            send_with_origin(app, Method::GET, "/v1/ldap/user/20011", origin).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], origin);
    }
}

#[tokio::test]
async fn test_cors_disallowed_origin() {
    let (_, app) = create_test_app_with_cors("", &cors());
    let (_, headers) =
        send_with_origin(app, Method::GET, "/v1/ldap/user/20011", "https://example.com").await;

    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_cors_preflight() {
    let (_, app) = create_test_app_with_cors("/ezldap/api", &cors());
    let (status, headers) = send_with_origin(
        app,
        Method::OPTIONS,
        "/ezldap/api/v1/ldap/ou/30002",
        "https://app.example.org",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.org"
    );
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("GET"));
}

#[tokio::test]
async fn test_cors_not_applied_outside_lookup_routes() {
    let (_, app) = create_test_app_with_cors("", &cors());
    let (_, headers) = send_with_origin(app, Method::GET, "/health", "https://app.example.org").await;
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = cors();
    config.enabled = false;
    let (_, app) = create_test_app_with_cors("", &config);
    let (status, headers) =
        send_with_origin(app, Method::GET, "/v1/ldap/user/20011", "https://app.example.org").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

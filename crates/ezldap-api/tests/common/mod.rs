//! Shared fixtures for ezldap-api integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use ezldap_api::{api_router, CorsConfig};
use ezldap_core::memory::sample::{self, OU_BASE, USER_BASE};
use ezldap_core::{InMemoryDirectory, LdapService};

/// Router over the sample directory, mounted below `api_path`.
pub fn create_test_app(api_path: &str) -> (Arc<InMemoryDirectory>, Router) {
    create_test_app_with_cors(api_path, &CorsConfig::default())
}

/// Like [`create_test_app`] with the given CORS settings.
pub fn create_test_app_with_cors(
    api_path: &str,
    cors: &CorsConfig,
) -> (Arc<InMemoryDirectory>, Router) {
    let directory = Arc::new(sample::directory().expect("sample directory is valid"));
    let service = LdapService::new(directory.clone(), USER_BASE, OU_BASE);
    (directory, api_router(api_path, Arc::new(service), cors))
}

/// Issue a request carrying an `Origin` header and return status and headers.
pub async fn send_with_origin(
    app: Router,
    method: Method,
    uri: &str,
    origin: &str,
) -> (StatusCode, HeaderMap) {
    let mut request = Request::builder()
        .method(method.clone())
        .uri(uri)
        .header(header::ORIGIN, origin);
    if method == Method::OPTIONS {
        request = request.header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET");
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    (response.status(), response.headers().clone())
}

/// Issue a GET request and decode the JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, headers, json)
}

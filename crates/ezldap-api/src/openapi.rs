//! `OpenAPI` documentation for the directory REST API.

use utoipa::OpenApi;

use ezldap_core::{Address, BaseUser, Ou, User};

use crate::error::ProblemDetails;
use crate::handlers;
use crate::models::HealthResponse;
use crate::router::mount_path;

/// Paths served at the root rather than below the lookup mount point.
const ROOT_PATHS: &[&str] = &["/health"];

/// `OpenAPI` documentation. Lookup paths are relative to `{api_path}/v1/ldap`;
/// use [`api_doc`] for the document as served.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ezldap API",
        version = "0.1.0",
        description = "Read-only person and OU lookups against the city directory"
    ),
    paths(
        handlers::health::health_handler,
        handlers::persons::get_person_handler,
        handlers::persons::get_person_by_uid_handler,
        handlers::persons::search_by_uid_handler,
        handlers::persons::find_persons_by_ou_handler,
        handlers::persons::ou_tree_by_user_handler,
        handlers::ous::get_ou_handler,
        handlers::ous::find_ou_by_short_code_handler,
        handlers::ous::ou_tree_by_short_code_handler,
    ),
    components(schemas(Address, BaseUser, User, Ou, ProblemDetails, HealthResponse)),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Persons", description = "Person lookups and searches"),
        (name = "OUs", description = "Organizational unit lookups")
    )
)]
pub struct ApiDoc;

/// The document with lookup paths placed below `{api_path}/v1/ldap`.
pub fn api_doc(api_path: &str) -> utoipa::openapi::OpenApi {
    let mount = mount_path(api_path);
    let mut doc = ApiDoc::openapi();
    doc.paths.paths = std::mem::take(&mut doc.paths.paths)
        .into_iter()
        .map(|(path, item)| {
            if ROOT_PATHS.contains(&path.as_str()) {
                (path, item)
            } else {
                (format!("{mount}{path}"), item)
            }
        })
        .collect();
    doc
}

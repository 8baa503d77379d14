// OpenAPI document generation
//
// This module defines the OpenAPI spec for the Vitrine auth API.
// It is used by both the server (for Swagger UI) and the export-openapi
// binary (for static spec generation).

use crate::api::{self, ErrorResponse, PrincipalResponse};
use crate::auth::routes;
use utoipa::OpenApi;

/// OpenAPI documentation for the Vitrine auth API
#[derive(OpenApi)]
#[openapi(
    paths(
        routes::login,
        routes::admin_login,
        routes::register,
        routes::logout,
        routes::get_current_user,
        routes::update_email,
        routes::update_password,
        routes::delete_account,
        api::pages::dashboard,
        api::pages::admin_home,
    ),
    components(
        schemas(
            ErrorResponse,
            PrincipalResponse,
            routes::LoginRequest,
            routes::RegisterRequest,
            routes::UpdateEmailRequest,
            routes::UpdatePasswordRequest,
            routes::SessionResponse,
            api::pages::DashboardResponse,
            api::pages::AdminResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login, registration and session endpoints"),
        (name = "account", description = "Account management for company users"),
        (name = "pages", description = "Protected area entry points")
    ),
    info(
        title = "Vitrine Auth API",
        version = "0.1.0",
        description = "Session authentication and authorization for the Vitrine business directory",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Pretty-printed JSON document
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

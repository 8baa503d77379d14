// Protected area entry points
//
// Page rendering lives in the frontend; these endpoints return the principal
// the frontend renders for. The guard has already run for both prefixes.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PrincipalResponse;
use crate::auth::{AdminUser, ApiError, AuthState, SessionUser};

/// Company dashboard context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub user: PrincipalResponse,
    /// Company the dashboard operates on
    pub empresa_id: String,
}

/// Admin area context
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    pub user: PrincipalResponse,
}

pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/admin", get(admin_home))
        .with_state(state)
}

/// GET /dashboard - Company dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard context", body = DashboardResponse),
        (status = 303, description = "Redirect to /login, /admin or /cadastro")
    ),
    tag = "pages"
)]
pub async fn dashboard(
    SessionUser(principal): SessionUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    // The guard only lets linked company sessions through
    let empresa_id = principal
        .empresa_id()
        .ok_or_else(|| ApiError::forbidden("Company registration not completed"))?
        .to_string();
    Ok(Json(DashboardResponse {
        user: (&principal).into(),
        empresa_id,
    }))
}

/// GET /admin - Admin area
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin context", body = AdminResponse),
        (status = 303, description = "Redirect to /admin/login or /login; a revoked admin session is cleared")
    ),
    tag = "pages"
)]
pub async fn admin_home(AdminUser(principal): AdminUser) -> Json<AdminResponse> {
    Json(AdminResponse {
        user: (&principal).into(),
    })
}

// Router assembly
// Decision: The guard wraps every route, including the fallback, so unknown
// protected paths still redirect instead of answering 404 to anonymous visitors

use axum::{
    extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Serialize;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{self, ErrorResponse};
use crate::auth::{self, AuthState};
use crate::openapi::ApiDoc;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    session_format: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    session_format: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        session_format: state.session_format,
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}

/// All routes behind the route guard, without CORS/trace layers
pub fn build_router(state: AuthState) -> Router {
    let health_state = HealthState {
        session_format: state.cookies.codec().format().name(),
    };

    Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(auth::routes(state.clone()))
        .merge(api::pages::routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, auth::guard_layer))
}

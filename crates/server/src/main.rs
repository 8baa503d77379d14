// Vitrine auth server
// Decision: Shared state is built once here and handed out as read-only Arc handles
// Decision: Local identity backend by default, Supabase Auth when configured

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use vitrine_core::telemetry::{init_telemetry, TelemetryConfig};
use vitrine_core::IdentityBackend;
use vitrine_server::auth::{
    bootstrap::ensure_admin, AuthState, GoTrueIdentityBackend, IdentityBackendKind,
    LocalIdentityBackend,
};
use vitrine_server::storage::StorageBackend;
use vitrine_server::{build_router, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - RUST_LOG / LOG_LEVEL: Log filter (default: "vitrine_server=debug,tower_http=debug")
    // - LOG_FORMAT: "json" for JSON lines
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "vitrine" {
        telemetry_config.service_name = "vitrine-server".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter = Some("vitrine_server=debug,tower_http=debug".to_string());
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(telemetry_config);

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(environment = %config.environment, "vitrine-server starting...");

    // Storage: PostgreSQL when DATABASE_URL is set, otherwise in-memory
    let storage = match &config.database_url {
        Some(url) => {
            let storage = StorageBackend::postgres(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            storage
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    let identity_backend: Arc<dyn IdentityBackend> = match config.auth.identity_backend {
        IdentityBackendKind::Local => Arc::new(LocalIdentityBackend::new(storage.clone())),
        IdentityBackendKind::Supabase => {
            let supabase = config
                .auth
                .supabase
                .clone()
                .context("Supabase identity backend selected without SUPABASE_URL")?;
            tracing::info!(url = %supabase.url, "Using Supabase Auth identity backend");
            Arc::new(GoTrueIdentityBackend::new(supabase).context("Failed to build HTTP client")?)
        }
    };

    let auth_state = AuthState::new(config.auth.clone(), storage, identity_backend);
    tracing::info!(
        identity_backend = ?config.auth.identity_backend,
        session_format = auth_state.cookies.codec().format().name(),
        session_max_age_secs = config.auth.session_max_age.as_secs(),
        secure_cookies = config.auth.secure_cookies,
        "Authentication configured"
    );

    ensure_admin(&auth_state)
        .await
        .context("Failed to seed admin account")?;

    let app = build_router(auth_state);

    // CORS is only needed when the frontend is served from another origin
    let app = if config.cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    };

    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

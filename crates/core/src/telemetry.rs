// Logging setup
//
// Builds the tracing-subscriber registry used by the server binary:
// - EnvFilter from RUST_LOG / LOG_LEVEL
// - Human-readable console output, or JSON lines when LOG_FORMAT=json

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, recorded once at startup
    pub service_name: String,
    /// Service version
    pub service_version: Option<String>,
    /// Environment (e.g., "development", "production")
    pub environment: Option<String>,
    /// Log filter (e.g., "info", "vitrine_server=debug")
    pub log_filter: Option<String>,
    /// Output format
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vitrine".to_string(),
            service_version: None,
            environment: None,
            log_filter: None,
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `SERVICE_NAME`: Service name (default: "vitrine")
    /// - `APP_ENV`: Deployment environment
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    /// - `LOG_FORMAT`: "json" for JSON lines
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "vitrine".to_string()),
            service_version: None,
            environment: std::env::var("APP_ENV").ok(),
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
            format: std::env::var("LOG_FORMAT")
                .map(|s| LogFormat::from_str(&s))
                .unwrap_or_default(),
        }
    }

    fn filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_telemetry(config: TelemetryConfig) {
    let (pretty_layer, json_layer) = match config.format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer().with_target(true)), None),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(pretty_layer)
        .with(json_layer)
        .init();

    tracing::info!(
        service = %config.service_name,
        version = config.service_version.as_deref().unwrap_or("unknown"),
        environment = config.environment.as_deref().unwrap_or("development"),
        "Logging initialized"
    );
}

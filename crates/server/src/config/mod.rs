// Server configuration loaded from environment variables
// Decision: No DATABASE_URL means in-memory dev mode
// Decision: CORS stays off unless CORS_ALLOWED_ORIGINS lists origins

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;

use crate::auth::AuthConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment (APP_ENV), "development" when unset
    pub environment: String,
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; None selects the in-memory backend
    pub database_url: Option<String>,
    /// Origins allowed for credentialed cross-origin requests
    pub cors_origins: Vec<HeaderValue>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = var("APP_ENV")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "development".to_string());

        let bind_addr = var("BIND_ADDR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid BIND_ADDR: {}", bind_addr))?;

        let database_url = var("DATABASE_URL").filter(|s| !s.is_empty());

        // Example: CORS_ALLOWED_ORIGINS="https://vitrine.example.com,https://admin.vitrine.example.com"
        let cors_origins: Vec<HeaderValue> = var("CORS_ALLOWED_ORIGINS")
            .filter(|s| !s.is_empty())
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        let auth = AuthConfig::from_lookup(&var)?;

        let mut config = Self {
            environment,
            bind_addr,
            database_url,
            cors_origins,
            auth,
        };
        config.auth.secure_cookies = config.is_production();
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.database_url.is_none());
        assert!(config.cors_origins.is_empty());
        assert!(!config.is_production());
        assert!(!config.auth.secure_cookies);
    }

    #[test]
    fn test_only_production_sets_secure_cookies() {
        let config = config_from(&[("APP_ENV", "staging")]).unwrap();
        assert!(!config.auth.secure_cookies);

        let config = config_from(&[("APP_ENV", "Production")]).unwrap();
        assert!(config.auth.secure_cookies);
    }

    #[test]
    fn test_production() {
        let config = config_from(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://vitrine@localhost/vitrine"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert!(config.auth.secure_cookies);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.database_url.is_some());
    }

    #[test]
    fn test_cors_origins() {
        let config = config_from(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example.com, https://b.example.com",
        )])
        .unwrap();
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.cors_origins[1], "https://b.example.com");
    }

    #[test]
    fn test_invalid_bind_addr() {
        assert!(config_from(&[("BIND_ADDR", "not-an-addr")]).is_err());
    }
}

// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for admin seeding, SESSION_ prefix for the session cookie
// Decision: Default to the local identity backend for development
// Decision: No SESSION_SECRET means unsigned (legacy) session cookies, with a warning

use std::time::Duration;

use anyhow::{bail, Result};
use vitrine_core::{SessionCodec, SessionFormat, DEFAULT_SESSION_TTL};

/// Which identity backend verifies passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityBackendKind {
    /// argon2 hashes in the usuarios table (PostgreSQL or in-memory)
    #[default]
    Local,
    /// Supabase Auth (GoTrue) over HTTP
    Supabase,
}

impl IdentityBackendKind {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "supabase" | "gotrue" => IdentityBackendKind::Supabase,
            _ => IdentityBackendKind::Local,
        }
    }
}

/// Supabase project settings
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

/// Admin account seeded at startup (local identity backend)
#[derive(Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Complete authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub identity_backend: IdentityBackendKind,
    pub supabase: Option<SupabaseConfig>,
    /// HMAC secret for signed session cookies
    pub session_secret: Option<String>,
    /// Session lifetime, fixed at issuance
    pub session_max_age: Duration,
    /// Set the Secure flag on the session cookie (set from APP_ENV=production)
    pub secure_cookies: bool,
    pub admin: Option<AdminConfig>,
    /// Whether to disable self-service company registration
    pub disable_signup: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("identity_backend", &self.identity_backend)
            .field("supabase", &self.supabase)
            .field("session_signed", &self.session_secret.is_some())
            .field("session_max_age", &self.session_max_age)
            .field("secure_cookies", &self.secure_cookies)
            .field("admin", &self.admin)
            .field("disable_signup", &self.disable_signup)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_backend: IdentityBackendKind::Local,
            supabase: None,
            session_secret: None,
            session_max_age: DEFAULT_SESSION_TTL,
            secure_cookies: false,
            admin: None,
            disable_signup: false,
        }
    }
}

impl AuthConfig {
    /// Load configuration through an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let identity_backend = non_empty("IDENTITY_BACKEND")
            .map(|s| IdentityBackendKind::from_str(&s))
            .unwrap_or_default();

        let supabase = match (non_empty("SUPABASE_URL"), non_empty("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
            }),
            _ => None,
        };

        if identity_backend == IdentityBackendKind::Supabase && supabase.is_none() {
            bail!("IDENTITY_BACKEND=supabase requires SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY");
        }

        let session_max_age = match non_empty("SESSION_MAX_AGE") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "Ignoring invalid SESSION_MAX_AGE");
                    DEFAULT_SESSION_TTL
                }
            },
            None => DEFAULT_SESSION_TTL,
        };

        let admin = match (non_empty("AUTH_ADMIN_EMAIL"), non_empty("AUTH_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminConfig { email, password }),
            _ => None,
        };

        let disable_signup = var("AUTH_DISABLE_SIGNUP")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Ok(Self {
            identity_backend,
            supabase,
            session_secret: non_empty("SESSION_SECRET"),
            session_max_age,
            // Decided by the deployment environment, see AppConfig
            secure_cookies: false,
            admin,
            disable_signup,
        })
    }

    /// Build the session codec for this configuration
    pub fn session_codec(&self) -> SessionCodec {
        let format = match &self.session_secret {
            Some(secret) => SessionFormat::signed(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "SESSION_SECRET not set, session cookies are unsigned and can be forged"
                );
                SessionFormat::Plain
            }
        };
        SessionCodec::new(self.session_max_age, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AuthConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_identity_backend_parsing() {
        assert_eq!(IdentityBackendKind::from_str("local"), IdentityBackendKind::Local);
        assert_eq!(IdentityBackendKind::from_str("SUPABASE"), IdentityBackendKind::Supabase);
        assert_eq!(IdentityBackendKind::from_str("gotrue"), IdentityBackendKind::Supabase);
        assert_eq!(IdentityBackendKind::from_str("invalid"), IdentityBackendKind::Local);
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.identity_backend, IdentityBackendKind::Local);
        assert_eq!(config.session_max_age, Duration::from_secs(604_800));
        assert!(!config.secure_cookies);
        assert!(config.admin.is_none());
        assert!(!config.disable_signup);
        assert!(!config.session_codec().format().is_signed());
    }

    #[test]
    fn test_session_secret_selects_signed_format() {
        let config = config_from(&[("SESSION_SECRET", "s3cret"), ("SESSION_MAX_AGE", "3600")])
            .unwrap();
        let codec = config.session_codec();
        assert!(codec.format().is_signed());
        assert_eq!(codec.ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_max_age_falls_back() {
        let config = config_from(&[("SESSION_MAX_AGE", "soon")]).unwrap();
        assert_eq!(config.session_max_age, DEFAULT_SESSION_TTL);

        let config = config_from(&[("SESSION_MAX_AGE", "0")]).unwrap();
        assert_eq!(config.session_max_age, DEFAULT_SESSION_TTL);
    }

    #[test]
    fn test_supabase_requires_project_settings() {
        assert!(config_from(&[("IDENTITY_BACKEND", "supabase")]).is_err());

        let config = config_from(&[
            ("IDENTITY_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ])
        .unwrap();
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.url, "https://abc.supabase.co");
        assert!(!format!("{:?}", supabase).contains("service-key"));
    }

    #[test]
    fn test_admin_requires_both_values() {
        let config = config_from(&[("AUTH_ADMIN_EMAIL", "admin@example.com")]).unwrap();
        assert!(config.admin.is_none());

        let config = config_from(&[
            ("AUTH_ADMIN_EMAIL", "admin@example.com"),
            ("AUTH_ADMIN_PASSWORD", "changeme"),
        ])
        .unwrap();
        let admin = config.admin.unwrap();
        assert_eq!(admin.email, "admin@example.com");
        assert!(!format!("{:?}", admin).contains("changeme"));
    }

    #[test]
    fn test_disable_signup_flag() {
        assert!(config_from(&[("AUTH_DISABLE_SIGNUP", "true")]).unwrap().disable_signup);
        assert!(config_from(&[("AUTH_DISABLE_SIGNUP", "1")]).unwrap().disable_signup);
        assert!(!config_from(&[("AUTH_DISABLE_SIGNUP", "no")]).unwrap().disable_signup);
    }
}

// Identity backend abstraction
//
// The identity backend owns email/password credentials. Implementations:
// - LocalIdentityBackend (vitrine-server): argon2 hashes in PostgreSQL or memory
// - GoTrueIdentityBackend (vitrine-server): Supabase Auth over HTTP
// - InMemoryIdentityBackend (this crate): plaintext map for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Identity confirmed by the backend. Carries no role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub id: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VerifiedIdentity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Email unknown or password wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity already exists")]
    AlreadyExists,

    #[error("Identity not found")]
    NotFound,

    /// Transport failure, 5xx, database down
    #[error("Identity backend unavailable: {0}")]
    Unavailable(String),
}

/// External credential store
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Check an email/password pair
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError>;

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError>;

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError>;

    async fn update_email(
        &self,
        identity_id: &str,
        new_email: &str,
    ) -> Result<VerifiedIdentity, IdentityError>;

    async fn update_password(
        &self,
        identity_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;
}

/// Canonical form used for lookups and storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Loja@Example.COM "), "loja@example.com");
        assert_eq!(normalize_email(""), "");
    }
}

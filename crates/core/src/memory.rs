// In-memory implementations for tests and quick prototyping
//
// These keep everything in process memory:
// - InMemoryIdentityBackend: plaintext credentials, can be switched "offline"
// - InMemoryCompanyProfileStore / InMemoryAdminStore: role records
//
// The server's dev mode uses its own argon2-backed storage instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::identity::{normalize_email, IdentityBackend, IdentityError, VerifiedIdentity};
use crate::roles::{AdminRecord, AdminStore, CompanyProfile, CompanyProfileStore};

#[derive(Debug, Clone)]
struct StoredIdentity {
    identity: VerifiedIdentity,
    password: String,
}

/// In-memory identity backend
#[derive(Debug, Default)]
pub struct InMemoryIdentityBackend {
    identities: RwLock<HashMap<String, StoredIdentity>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryIdentityBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity with a fixed id (useful for scenario tests)
    pub fn seed(&self, id: &str, email: &str, password: &str) -> VerifiedIdentity {
        let now = Utc::now();
        let identity = VerifiedIdentity {
            id: id.to_string(),
            email: normalize_email(email),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.identities.write().insert(
            id.to_string(),
            StoredIdentity {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        identity
    }

    /// Simulate the backend being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.identities.read().contains_key(id)
    }

    fn check_online(&self) -> Result<(), IdentityError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("backend offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityBackend for InMemoryIdentityBackend {
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        self.check_online()?;
        let email = normalize_email(email);
        self.identities
            .read()
            .values()
            .find(|s| s.identity.email == email && s.password == password)
            .map(|s| s.identity.clone())
            .ok_or(IdentityError::InvalidCredentials)
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        self.check_online()?;
        let email = normalize_email(email);
        if self
            .identities
            .read()
            .values()
            .any(|s| s.identity.email == email)
        {
            return Err(IdentityError::AlreadyExists);
        }
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(self.seed(&id, &email, password))
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError> {
        self.check_online()?;
        self.identities
            .write()
            .remove(identity_id)
            .map(|_| ())
            .ok_or(IdentityError::NotFound)
    }

    async fn update_email(
        &self,
        identity_id: &str,
        new_email: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        self.check_online()?;
        let new_email = normalize_email(new_email);
        let mut identities = self.identities.write();
        if identities
            .values()
            .any(|s| s.identity.email == new_email && s.identity.id != identity_id)
        {
            return Err(IdentityError::AlreadyExists);
        }
        let stored = identities
            .get_mut(identity_id)
            .ok_or(IdentityError::NotFound)?;
        stored.identity.email = new_email;
        stored.identity.updated_at = Some(Utc::now());
        Ok(stored.identity.clone())
    }

    async fn update_password(
        &self,
        identity_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        self.check_online()?;
        let mut identities = self.identities.write();
        let stored = identities
            .get_mut(identity_id)
            .ok_or(IdentityError::NotFound)?;
        stored.password = new_password.to_string();
        stored.identity.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// In-memory `perfis_empresas`
#[derive(Debug, Default)]
pub struct InMemoryCompanyProfileStore {
    profiles: RwLock<HashMap<String, Option<String>>>,
}

impl InMemoryCompanyProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity_id: &str, empresa_id: Option<&str>) {
        self.profiles
            .write()
            .insert(identity_id.to_string(), empresa_id.map(str::to_string));
    }
}

#[async_trait]
impl CompanyProfileStore for InMemoryCompanyProfileStore {
    async fn find_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<CompanyProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .get(identity_id)
            .map(|empresa_id| CompanyProfile {
                identity_id: identity_id.to_string(),
                empresa_id: empresa_id.clone(),
            }))
    }
}

/// In-memory `admins`
#[derive(Debug, Default)]
pub struct InMemoryAdminStore {
    admins: RwLock<Vec<String>>,
}

impl InMemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity_id: &str) {
        let mut admins = self.admins.write();
        if !admins.iter().any(|a| a == identity_id) {
            admins.push(identity_id.to_string());
        }
    }

    pub fn remove(&self, identity_id: &str) {
        self.admins.write().retain(|a| a != identity_id);
    }
}

#[async_trait]
impl AdminStore for InMemoryAdminStore {
    async fn find_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<AdminRecord>, StoreError> {
        Ok(self
            .admins
            .read()
            .iter()
            .find(|a| a.as_str() == identity_id)
            .map(|a| AdminRecord {
                identity_id: a.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_lifecycle() {
        let backend = InMemoryIdentityBackend::new();
        let created = backend
            .create_identity("Loja@Example.com", "s3cret")
            .await
            .unwrap();
        assert_eq!(created.email, "loja@example.com");

        let verified = backend
            .verify_password("loja@example.com", "s3cret")
            .await
            .unwrap();
        assert_eq!(verified.id, created.id);

        assert_eq!(
            backend.create_identity("loja@example.com", "x").await,
            Err(IdentityError::AlreadyExists)
        );

        backend.delete_identity(&created.id).await.unwrap();
        assert_eq!(
            backend.verify_password("loja@example.com", "s3cret").await,
            Err(IdentityError::InvalidCredentials)
        );
        assert_eq!(
            backend.delete_identity(&created.id).await,
            Err(IdentityError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_offline_backend() {
        let backend = InMemoryIdentityBackend::new();
        backend.seed("U1", "loja@example.com", "pw");
        backend.set_offline(true);
        assert!(matches!(
            backend.verify_password("loja@example.com", "pw").await,
            Err(IdentityError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_store_insert_is_idempotent() {
        let store = InMemoryAdminStore::new();
        store.insert("U2");
        store.insert("U2");
        assert!(store.find_by_identity_id("U2").await.unwrap().is_some());
        store.remove("U2");
        assert!(store.find_by_identity_id("U2").await.unwrap().is_none());
    }
}

// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// StorageBackend works with either PostgreSQL (production) or in-memory
// (dev mode) storage and implements the role stores the core resolver needs.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vitrine_core::{AdminRecord, AdminStore, CompanyProfile, CompanyProfileStore, StoreError};

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Get the PostgreSQL pool if using PostgreSQL backend
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    // ============================================
    // Usuarios
    // ============================================

    pub async fn create_usuario(&self, input: CreateUsuarioRow) -> Result<UsuarioRow> {
        match self {
            Self::Postgres(db) => db.create_usuario(input).await,
            Self::InMemory(db) => db.create_usuario(input).await,
        }
    }

    pub async fn get_usuario_by_email(&self, email: &str) -> Result<Option<UsuarioRow>> {
        match self {
            Self::Postgres(db) => db.get_usuario_by_email(email).await,
            Self::InMemory(db) => db.get_usuario_by_email(email).await,
        }
    }

    pub async fn update_usuario_email(&self, id: Uuid, email: &str) -> Result<Option<UsuarioRow>> {
        match self {
            Self::Postgres(db) => db.update_usuario_email(id, email).await,
            Self::InMemory(db) => db.update_usuario_email(id, email).await,
        }
    }

    pub async fn update_usuario_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.update_usuario_password(id, password_hash).await,
            Self::InMemory(db) => db.update_usuario_password(id, password_hash).await,
        }
    }

    pub async fn delete_usuario(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_usuario(id).await,
            Self::InMemory(db) => db.delete_usuario(id).await,
        }
    }

    // ============================================
    // Perfis de empresas
    // ============================================

    pub async fn get_perfil_empresa(&self, user_id: Uuid) -> Result<Option<PerfilEmpresaRow>> {
        match self {
            Self::Postgres(db) => db.get_perfil_empresa(user_id).await,
            Self::InMemory(db) => db.get_perfil_empresa(user_id).await,
        }
    }

    pub async fn create_perfil_empresa(
        &self,
        user_id: Uuid,
        empresa_id: Option<Uuid>,
    ) -> Result<PerfilEmpresaRow> {
        match self {
            Self::Postgres(db) => db.create_perfil_empresa(user_id, empresa_id).await,
            Self::InMemory(db) => db.create_perfil_empresa(user_id, empresa_id).await,
        }
    }

    pub async fn delete_perfil_empresa(&self, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_perfil_empresa(user_id).await,
            Self::InMemory(db) => db.delete_perfil_empresa(user_id).await,
        }
    }

    // ============================================
    // Admins
    // ============================================

    pub async fn get_admin(&self, user_id: Uuid) -> Result<Option<AdminRow>> {
        match self {
            Self::Postgres(db) => db.get_admin(user_id).await,
            Self::InMemory(db) => db.get_admin(user_id).await,
        }
    }

    pub async fn create_admin(&self, user_id: Uuid) -> Result<AdminRow> {
        match self {
            Self::Postgres(db) => db.create_admin(user_id).await,
            Self::InMemory(db) => db.create_admin(user_id).await,
        }
    }
}

#[async_trait]
impl CompanyProfileStore for StorageBackend {
    async fn find_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<CompanyProfile>, StoreError> {
        let Some(user_id) = parse_identity_id(identity_id) else {
            return Ok(None);
        };
        let row = self.get_perfil_empresa(user_id).await?;
        Ok(row.map(CompanyProfile::from))
    }
}

#[async_trait]
impl AdminStore for StorageBackend {
    async fn find_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<AdminRecord>, StoreError> {
        let Some(user_id) = parse_identity_id(identity_id) else {
            return Ok(None);
        };
        let row = self.get_admin(user_id).await?;
        Ok(row.map(AdminRecord::from))
    }
}

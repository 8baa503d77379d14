// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Mirrors the PostgreSQL repository API so the server can run without a
// database. Deleting a usuario cascades to its profile and admin rows, as the
// SQL schema does.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    usuarios: RwLock<HashMap<Uuid, UsuarioRow>>,
    perfis_empresas: RwLock<HashMap<Uuid, PerfilEmpresaRow>>,
    admins: RwLock<HashMap<Uuid, AdminRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Usuarios
    // ============================================

    pub async fn create_usuario(&self, input: CreateUsuarioRow) -> Result<UsuarioRow> {
        let mut usuarios = self.usuarios.write();
        if usuarios.values().any(|u| u.email == input.email) {
            return Err(DuplicateEmail(input.email).into());
        }
        let now = Self::now();
        let row = UsuarioRow {
            id: Uuid::now_v7(),
            email: input.email,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        };
        usuarios.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_usuario_by_email(&self, email: &str) -> Result<Option<UsuarioRow>> {
        Ok(self
            .usuarios
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    pub async fn update_usuario_email(&self, id: Uuid, email: &str) -> Result<Option<UsuarioRow>> {
        let mut usuarios = self.usuarios.write();
        if usuarios.values().any(|u| u.email == email && u.id != id) {
            return Err(DuplicateEmail(email.to_string()).into());
        }
        if let Some(usuario) = usuarios.get_mut(&id) {
            usuario.email = email.to_string();
            usuario.updated_at = Self::now();
            return Ok(Some(usuario.clone()));
        }
        Ok(None)
    }

    pub async fn update_usuario_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut usuarios = self.usuarios.write();
        if let Some(usuario) = usuarios.get_mut(&id) {
            usuario.password_hash = password_hash.to_string();
            usuario.updated_at = Self::now();
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn delete_usuario(&self, id: Uuid) -> Result<bool> {
        let removed = self.usuarios.write().remove(&id).is_some();
        if removed {
            self.perfis_empresas.write().remove(&id);
            self.admins.write().remove(&id);
        }
        Ok(removed)
    }

    // ============================================
    // Perfis de empresas
    // ============================================

    pub async fn get_perfil_empresa(&self, user_id: Uuid) -> Result<Option<PerfilEmpresaRow>> {
        Ok(self.perfis_empresas.read().get(&user_id).cloned())
    }

    pub async fn create_perfil_empresa(
        &self,
        user_id: Uuid,
        empresa_id: Option<Uuid>,
    ) -> Result<PerfilEmpresaRow> {
        let mut perfis = self.perfis_empresas.write();
        if perfis.contains_key(&user_id) {
            return Err(anyhow!("company profile already exists for {}", user_id));
        }
        let row = PerfilEmpresaRow {
            user_id,
            empresa_id,
            created_at: Self::now(),
        };
        perfis.insert(user_id, row.clone());
        Ok(row)
    }

    pub async fn delete_perfil_empresa(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.perfis_empresas.write().remove(&user_id).is_some())
    }

    // ============================================
    // Admins
    // ============================================

    pub async fn get_admin(&self, user_id: Uuid) -> Result<Option<AdminRow>> {
        Ok(self.admins.read().get(&user_id).cloned())
    }

    pub async fn create_admin(&self, user_id: Uuid) -> Result<AdminRow> {
        let row = self
            .admins
            .write()
            .entry(user_id)
            .or_insert_with(|| AdminRow {
                user_id,
                created_at: Self::now(),
            })
            .clone();
        Ok(row)
    }
}

// Database row types
//
// Tables:
// - usuarios: local identities (only used with the local identity backend)
// - perfis_empresas: company profile, one per identity, empresa_id nullable
// - admins: one row per administrator identity

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use vitrine_core::{AdminRecord, CompanyProfile, VerifiedIdentity};

/// Another usuario already holds this email (unique key on usuarios.email)
#[derive(Debug, thiserror::Error)]
#[error("email already registered: {0}")]
pub struct DuplicateEmail(pub String);

#[derive(Debug, Clone, FromRow)]
pub struct UsuarioRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UsuarioRow {
    pub fn to_identity(&self) -> VerifiedIdentity {
        VerifiedIdentity {
            id: self.id.to_string(),
            email: self.email.clone(),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUsuarioRow {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PerfilEmpresaRow {
    pub user_id: Uuid,
    pub empresa_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<PerfilEmpresaRow> for CompanyProfile {
    fn from(row: PerfilEmpresaRow) -> Self {
        CompanyProfile {
            identity_id: row.user_id.to_string(),
            empresa_id: row.empresa_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminRow {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        AdminRecord {
            identity_id: row.user_id.to_string(),
        }
    }
}

/// Identity ids are UUIDs in every backend we store; anything else cannot match a row
pub fn parse_identity_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity_id() {
        let id = Uuid::now_v7();
        assert_eq!(parse_identity_id(&id.to_string()), Some(id));
        assert_eq!(parse_identity_id("not-a-uuid"), None);
        assert_eq!(parse_identity_id(""), None);
    }

    #[test]
    fn test_profile_conversion_keeps_missing_company() {
        let user_id = Uuid::now_v7();
        let profile: CompanyProfile = PerfilEmpresaRow {
            user_id,
            empresa_id: None,
            created_at: Utc::now(),
        }
        .into();
        assert_eq!(profile.identity_id, user_id.to_string());
        assert_eq!(profile.empresa_id, None);
    }
}

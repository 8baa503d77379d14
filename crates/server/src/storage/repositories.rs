// PostgreSQL repository
// Decision: Plain sqlx::query_as with explicit column lists, no compile-time macros
// Decision: Deleting an identity relies on ON DELETE CASCADE for perfis_empresas/admins

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

/// Unique violations on usuarios.email become `DuplicateEmail`; the check-then-insert
/// in the identity backend can race
fn email_conflict(err: sqlx::Error, email: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DuplicateEmail(email.to_string()).into()
        }
        _ => err.into(),
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Usuarios (local identities)
    // ============================================

    pub async fn create_usuario(&self, input: CreateUsuarioRow) -> Result<UsuarioRow> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            INSERT INTO usuarios (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| email_conflict(e, &input.email))?;

        Ok(row)
    }

    pub async fn get_usuario_by_email(&self, email: &str) -> Result<Option<UsuarioRow>> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM usuarios
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_usuario_email(&self, id: Uuid, email: &str) -> Result<Option<UsuarioRow>> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            UPDATE usuarios
            SET email = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| email_conflict(e, email))?;

        Ok(row)
    }

    pub async fn update_usuario_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE usuarios
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_usuario(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Perfis de empresas (company profiles)
    // ============================================

    pub async fn get_perfil_empresa(&self, user_id: Uuid) -> Result<Option<PerfilEmpresaRow>> {
        let row = sqlx::query_as::<_, PerfilEmpresaRow>(
            r#"
            SELECT user_id, empresa_id, created_at
            FROM perfis_empresas
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn create_perfil_empresa(
        &self,
        user_id: Uuid,
        empresa_id: Option<Uuid>,
    ) -> Result<PerfilEmpresaRow> {
        let row = sqlx::query_as::<_, PerfilEmpresaRow>(
            r#"
            INSERT INTO perfis_empresas (user_id, empresa_id)
            VALUES ($1, $2)
            RETURNING user_id, empresa_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(empresa_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_perfil_empresa(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM perfis_empresas WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Admins
    // ============================================

    pub async fn get_admin(&self, user_id: Uuid) -> Result<Option<AdminRow>> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT user_id, created_at
            FROM admins
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Idempotent: returns the existing row when the identity is already an admin
    pub async fn create_admin(&self, user_id: Uuid) -> Result<AdminRow> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            INSERT INTO admins (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

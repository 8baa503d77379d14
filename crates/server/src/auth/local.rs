// Local identity backend over the usuarios table
// Decision: argon2 hashes; unknown emails still pay for one verification
// Decision: Storage failures are Unavailable, never InvalidCredentials; a lost
// race on the unique email key is AlreadyExists

use async_trait::async_trait;
use vitrine_core::{normalize_email, IdentityBackend, IdentityError, VerifiedIdentity};

use crate::storage::{
    parse_identity_id,
    password::{hash_password, verify_against_dummy, verify_password},
    CreateUsuarioRow, DuplicateEmail, StorageBackend,
};

#[derive(Clone)]
pub struct LocalIdentityBackend {
    storage: StorageBackend,
}

impl LocalIdentityBackend {
    pub fn new(storage: StorageBackend) -> Self {
        Self { storage }
    }
}

fn unavailable(e: anyhow::Error) -> IdentityError {
    IdentityError::Unavailable(format!("{:#}", e))
}

fn write_error(e: anyhow::Error) -> IdentityError {
    if e.downcast_ref::<DuplicateEmail>().is_some() {
        IdentityError::AlreadyExists
    } else {
        unavailable(e)
    }
}

#[async_trait]
impl IdentityBackend for LocalIdentityBackend {
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let email = normalize_email(email);
        let usuario = self
            .storage
            .get_usuario_by_email(&email)
            .await
            .map_err(unavailable)?;

        let Some(usuario) = usuario else {
            verify_against_dummy(password);
            return Err(IdentityError::InvalidCredentials);
        };

        let valid = verify_password(password, &usuario.password_hash).map_err(|e| {
            tracing::error!(identity_id = %usuario.id, error = %e, "Stored password hash is unreadable");
            IdentityError::InvalidCredentials
        })?;

        if !valid {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(usuario.to_identity())
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let email = normalize_email(email);
        let existing = self
            .storage
            .get_usuario_by_email(&email)
            .await
            .map_err(unavailable)?;
        if existing.is_some() {
            return Err(IdentityError::AlreadyExists);
        }

        let password_hash = hash_password(password).map_err(unavailable)?;
        let usuario = self
            .storage
            .create_usuario(CreateUsuarioRow {
                email,
                password_hash,
            })
            .await
            .map_err(write_error)?;

        tracing::info!(identity_id = %usuario.id, "Local identity created");
        Ok(usuario.to_identity())
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError> {
        let id = parse_identity_id(identity_id).ok_or(IdentityError::NotFound)?;
        let deleted = self.storage.delete_usuario(id).await.map_err(unavailable)?;
        if !deleted {
            return Err(IdentityError::NotFound);
        }
        tracing::info!(identity_id = %id, "Local identity deleted");
        Ok(())
    }

    async fn update_email(
        &self,
        identity_id: &str,
        new_email: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let id = parse_identity_id(identity_id).ok_or(IdentityError::NotFound)?;
        let email = normalize_email(new_email);

        let taken = self
            .storage
            .get_usuario_by_email(&email)
            .await
            .map_err(unavailable)?;
        if taken.is_some_and(|u| u.id != id) {
            return Err(IdentityError::AlreadyExists);
        }

        let usuario = self
            .storage
            .update_usuario_email(id, &email)
            .await
            .map_err(write_error)?
            .ok_or(IdentityError::NotFound)?;
        Ok(usuario.to_identity())
    }

    async fn update_password(
        &self,
        identity_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let id = parse_identity_id(identity_id).ok_or(IdentityError::NotFound)?;
        let password_hash = hash_password(new_password).map_err(unavailable)?;
        let updated = self
            .storage
            .update_usuario_password(id, &password_hash)
            .await
            .map_err(unavailable)?;
        if !updated {
            return Err(IdentityError::NotFound);
        }
        Ok(())
    }
}

// Startup seeding of the configured administrator
// Decision: Idempotent; an existing identity is reused when the configured password still matches
// Decision: A mismatching password is logged and left alone, never overwritten

use anyhow::{anyhow, Context, Result};
use vitrine_core::IdentityError;

use super::middleware::AuthState;
use crate::storage::parse_identity_id;

/// Make sure AUTH_ADMIN_EMAIL exists and has an admins row.
/// Returns the admin identity id when an admin is configured and usable.
pub async fn ensure_admin(state: &AuthState) -> Result<Option<String>> {
    let Some(admin) = state.config.admin.as_ref() else {
        return Ok(None);
    };
    let backend = state.identity_backend();

    let identity = match backend.create_identity(&admin.email, &admin.password).await {
        Ok(identity) => {
            tracing::info!(email = %admin.email, "Created admin identity");
            identity
        }
        Err(IdentityError::AlreadyExists) => {
            match backend.verify_password(&admin.email, &admin.password).await {
                Ok(identity) => identity,
                Err(IdentityError::InvalidCredentials) => {
                    tracing::warn!(
                        email = %admin.email,
                        "Admin identity exists with a different password, not seeding"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e).context("Failed to verify admin identity"),
            }
        }
        Err(e) => return Err(e).context("Failed to create admin identity"),
    };

    let user_id = parse_identity_id(&identity.id)
        .ok_or_else(|| anyhow!("admin identity id is not a UUID: {}", identity.id))?;
    state
        .storage
        .create_admin(user_id)
        .await
        .context("Failed to create admins row")?;

    tracing::info!(identity_id = %user_id, "Admin account ready");
    Ok(Some(identity.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{config::AdminConfig, local::LocalIdentityBackend, AuthConfig};
    use crate::storage::StorageBackend;
    use std::sync::Arc;
    use vitrine_core::Role;

    fn state(password: &str) -> AuthState {
        let storage = StorageBackend::in_memory();
        let config = AuthConfig {
            admin: Some(AdminConfig {
                email: "admin@example.com".to_string(),
                password: password.to_string(),
            }),
            ..Default::default()
        };
        AuthState::new(
            config,
            storage.clone(),
            Arc::new(LocalIdentityBackend::new(storage)),
        )
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let state = state("changeme");
        let id = ensure_admin(&state).await.unwrap().unwrap();

        let principal = state.login.login("admin@example.com", "changeme").await.unwrap();
        assert_eq!(principal.id(), id);
        assert_eq!(principal.role(), Role::Admin);
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let state = state("changeme");
        let first = ensure_admin(&state).await.unwrap();
        let second = ensure_admin(&state).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_admin_configured() {
        let storage = StorageBackend::in_memory();
        let state = AuthState::new(
            AuthConfig::default(),
            storage.clone(),
            Arc::new(LocalIdentityBackend::new(storage)),
        );
        assert_eq!(ensure_admin(&state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_password_mismatch_is_skipped() {
        let state = state("changeme");
        state
            .identity_backend()
            .create_identity("admin@example.com", "something-else")
            .await
            .unwrap();

        assert_eq!(ensure_admin(&state).await.unwrap(), None);
    }
}

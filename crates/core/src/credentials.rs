// Credential verifier
// Decision: Wrong email and wrong password are indistinguishable to the caller
// Decision: Backend outages surface as BackendUnavailable so the UI can offer a retry

use std::sync::Arc;

use crate::error::AuthError;
use crate::identity::{normalize_email, IdentityBackend, IdentityError, VerifiedIdentity};

/// Checks email/password pairs against the identity backend
#[derive(Clone)]
pub struct CredentialVerifier {
    backend: Arc<dyn IdentityBackend>,
}

impl CredentialVerifier {
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn IdentityBackend> {
        &self.backend
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<VerifiedIdentity, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        match self.backend.verify_password(&email, password).await {
            Ok(identity) => Ok(identity),
            Err(IdentityError::InvalidCredentials) | Err(IdentityError::NotFound) => {
                tracing::debug!("Credential check rejected");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!(error = %e, "Identity backend error during credential check");
                Err(AuthError::BackendUnavailable)
            }
        }
    }
}

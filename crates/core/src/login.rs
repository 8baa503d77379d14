// Login flow: Credential Verifier -> Role Resolver -> Principal
//
// The HTTP layer hands the resulting principal to the session store.

use std::sync::Arc;

use crate::credentials::CredentialVerifier;
use crate::error::AuthError;
use crate::identity::{IdentityBackend, VerifiedIdentity};
use crate::principal::Principal;
use crate::roles::RoleResolver;

#[derive(Clone)]
pub struct LoginService {
    verifier: CredentialVerifier,
    resolver: RoleResolver,
}

impl LoginService {
    pub fn new(backend: Arc<dyn IdentityBackend>, resolver: RoleResolver) -> Self {
        Self {
            verifier: CredentialVerifier::new(backend),
            resolver,
        }
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn identity_backend(&self) -> &Arc<dyn IdentityBackend> {
        self.verifier.backend()
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let identity = self.verifier.verify(email, password).await?;
        let principal = self.principal_for(identity).await?;
        tracing::info!(
            identity_id = %principal.id(),
            role = %principal.role(),
            "Login succeeded"
        );
        Ok(principal)
    }

    /// Builds a fresh principal for an already-verified identity
    /// (after registration or an email change)
    pub async fn principal_for(&self, identity: VerifiedIdentity) -> Result<Principal, AuthError> {
        let grant = self.resolver.resolve(&identity.id).await?;
        Ok(grant.into_principal(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryAdminStore, InMemoryCompanyProfileStore, InMemoryIdentityBackend};
    use crate::principal::Role;

    struct Fixture {
        identities: Arc<InMemoryIdentityBackend>,
        profiles: Arc<InMemoryCompanyProfileStore>,
        admins: Arc<InMemoryAdminStore>,
        service: LoginService,
    }

    fn fixture() -> Fixture {
        let identities = Arc::new(InMemoryIdentityBackend::new());
        let profiles = Arc::new(InMemoryCompanyProfileStore::new());
        let admins = Arc::new(InMemoryAdminStore::new());
        let service = LoginService::new(
            identities.clone(),
            RoleResolver::standard(profiles.clone(), admins.clone()),
        );
        Fixture {
            identities,
            profiles,
            admins,
            service,
        }
    }

    #[tokio::test]
    async fn test_company_login() {
        let f = fixture();
        f.identities.seed("U1", "loja@example.com", "pw1");
        f.profiles.insert("U1", Some("C1"));

        let principal = f.service.login("loja@example.com", "pw1").await.unwrap();
        assert_eq!(principal.role(), Role::Company);
        assert_eq!(principal.empresa_id(), Some("C1"));
        assert!(principal.created_at().is_some());
    }

    #[tokio::test]
    async fn test_admin_login() {
        let f = fixture();
        f.identities.seed("U2", "admin@example.com", "pw2");
        f.admins.insert("U2");

        let principal = f.service.login("admin@example.com", "pw2").await.unwrap();
        assert_eq!(principal.role(), Role::Admin);
        assert_eq!(principal.empresa_id(), None);
    }

    #[tokio::test]
    async fn test_login_without_role_is_denied() {
        let f = fixture();
        f.identities.seed("U9", "orphan@example.com", "pw");

        let err = f.service.login("orphan@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::UnknownPrincipal);
    }

    #[tokio::test]
    async fn test_wrong_password_never_reaches_resolver() {
        let f = fixture();
        f.identities.seed("U1", "loja@example.com", "pw1");

        let err = f.service.login("loja@example.com", "bad").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }
}

// Role resolution
// Decision: Roles come from companion records, never from user input
// Decision: Priority-ordered lookup strategies, first match wins; a second match is a
//           data-integrity warning, not an error
// Decision: No match fails closed with UnknownPrincipal

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AuthError, StoreError};
use crate::identity::VerifiedIdentity;
use crate::principal::{Principal, Role};

/// Row of `perfis_empresas`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyProfile {
    pub identity_id: String,
    /// `None` until the company record is created
    pub empresa_id: Option<String>,
}

/// Row of `admins`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub identity_id: String,
}

#[async_trait]
pub trait CompanyProfileStore: Send + Sync {
    async fn find_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<CompanyProfile>, StoreError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_identity_id(&self, identity_id: &str)
        -> Result<Option<AdminRecord>, StoreError>;
}

/// Role granted by one lookup strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrant {
    Company { empresa_id: Option<String> },
    Admin,
}

impl RoleGrant {
    pub fn role(&self) -> Role {
        match self {
            RoleGrant::Company { .. } => Role::Company,
            RoleGrant::Admin => Role::Admin,
        }
    }

    pub fn into_principal(self, identity: VerifiedIdentity) -> Principal {
        let principal = match self {
            RoleGrant::Company { empresa_id } => {
                Principal::company(identity.id, identity.email, empresa_id)
            }
            RoleGrant::Admin => Principal::admin(identity.id, identity.email),
        };
        principal.with_timestamps(identity.created_at, identity.updated_at)
    }
}

/// One way of deriving a role from an identity id
#[async_trait]
pub trait RoleLookup: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, identity_id: &str) -> Result<Option<RoleGrant>, StoreError>;
}

/// Grants `Company` when a company profile exists
pub struct CompanyProfileLookup {
    store: Arc<dyn CompanyProfileStore>,
}

impl CompanyProfileLookup {
    pub fn new(store: Arc<dyn CompanyProfileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleLookup for CompanyProfileLookup {
    fn name(&self) -> &'static str {
        "company_profile"
    }

    async fn lookup(&self, identity_id: &str) -> Result<Option<RoleGrant>, StoreError> {
        Ok(self
            .store
            .find_by_identity_id(identity_id)
            .await?
            .map(|profile| RoleGrant::Company {
                empresa_id: profile.empresa_id,
            }))
    }
}

/// Grants `Admin` when an admin row exists
pub struct AdminLookup {
    store: Arc<dyn AdminStore>,
}

impl AdminLookup {
    pub fn new(store: Arc<dyn AdminStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleLookup for AdminLookup {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn lookup(&self, identity_id: &str) -> Result<Option<RoleGrant>, StoreError> {
        Ok(self
            .store
            .find_by_identity_id(identity_id)
            .await?
            .map(|_| RoleGrant::Admin))
    }
}

/// Tries each lookup in order; the first grant wins
#[derive(Clone)]
pub struct RoleResolver {
    lookups: Vec<Arc<dyn RoleLookup>>,
}

impl RoleResolver {
    pub fn new(lookups: Vec<Arc<dyn RoleLookup>>) -> Self {
        Self { lookups }
    }

    /// Company profile first, then admin
    pub fn standard(profiles: Arc<dyn CompanyProfileStore>, admins: Arc<dyn AdminStore>) -> Self {
        Self::new(vec![
            Arc::new(CompanyProfileLookup::new(profiles)),
            Arc::new(AdminLookup::new(admins)),
        ])
    }

    pub async fn resolve(&self, identity_id: &str) -> Result<RoleGrant, AuthError> {
        let mut resolved: Option<(&'static str, RoleGrant)> = None;

        for lookup in &self.lookups {
            match lookup.lookup(identity_id).await {
                Ok(Some(grant)) => match &resolved {
                    None => resolved = Some((lookup.name(), grant)),
                    Some((winner, _)) => {
                        tracing::warn!(
                            identity_id,
                            winner,
                            ignored = lookup.name(),
                            "Identity matches more than one role record"
                        );
                    }
                },
                Ok(None) => {}
                Err(e) if resolved.is_some() => {
                    // Role already decided; only the integrity check failed
                    tracing::warn!(identity_id, lookup = lookup.name(), error = %e, "Role integrity check failed");
                }
                Err(e) => {
                    tracing::error!(identity_id, lookup = lookup.name(), error = %e, "Role lookup failed");
                    return Err(AuthError::BackendUnavailable);
                }
            }
        }

        match resolved {
            Some((source, grant)) => {
                tracing::debug!(identity_id, source, role = %grant.role(), "Role resolved");
                Ok(grant)
            }
            None => {
                tracing::warn!(identity_id, "Verified identity has no role record");
                Err(AuthError::UnknownPrincipal)
            }
        }
    }
}

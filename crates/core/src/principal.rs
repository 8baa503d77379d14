// Authenticated principal
// Decision: Fields are private so the admin/company invariant holds for every value
// Decision: No setters; a changed principal means a new login and a new cookie

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization scope of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// User linked to a company listing
    #[serde(rename = "empresa")]
    Company,
    /// Directory moderator
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Company => "empresa",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity reconstructed from a session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: String,
    email: String,
    #[serde(rename = "tipo")]
    role: Role,
    empresa_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// Company user. `empresa_id` is `None` while registration is unfinished.
    pub fn company(
        id: impl Into<String>,
        email: impl Into<String>,
        empresa_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: Role::Company,
            empresa_id,
            created_at: None,
            updated_at: None,
        }
    }

    /// Admin user; never linked to a company
    pub fn admin(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: Role::Admin,
            empresa_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach the identity record timestamps carried in the cookie
    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn empresa_id(&self) -> Option<&str> {
        self.empresa_id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Company principal whose company record already exists
    pub fn has_linked_company(&self) -> bool {
        self.role == Role::Company && self.empresa_id.is_some()
    }
}

// Common DTOs for the public API
//
// These types are shared across multiple API endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vitrine_core::Principal;

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

/// The authenticated principal as exposed to clients.
///
/// Field names follow the session cookie payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    pub id: String,
    pub email: String,
    /// "empresa" or "admin"
    #[schema(example = "empresa")]
    pub tipo: String,
    /// Linked company; null for admins and unfinished registrations
    pub empresa_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id().to_string(),
            email: principal.email().to_string(),
            tipo: principal.role().as_str().to_string(),
            empresa_id: principal.empresa_id().map(str::to_string),
            created_at: principal.created_at(),
            updated_at: principal.updated_at(),
        }
    }
}

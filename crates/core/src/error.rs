// Error taxonomy for the auth layer

use thiserror::Error;

/// Reasons a session token cannot be turned back into a principal.
///
/// Every variant means "no session" to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not a JSON document / JWT, or required fields missing
    #[error("Malformed session token: {0}")]
    Malformed(String),

    /// Signed token whose signature does not verify
    #[error("Session signature is invalid")]
    InvalidSignature,

    /// Token expiry is at or before the current instant
    #[error("Session expired")]
    Expired,

    /// Payload violates the principal invariants (e.g. admin with a company link)
    #[error("Session principal is inconsistent")]
    InvalidPrincipal,
}

/// Errors surfaced by login, role resolution and authorization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong email or password; never says which
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Identity backend or role stores unreachable
    #[error("Authentication backend unavailable")]
    BackendUnavailable,

    /// Credentials verified but neither a company profile nor an admin row exists
    #[error("No role found for principal")]
    UnknownPrincipal,

    /// Session cookie could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Valid session, insufficient role
    #[error("Access denied")]
    Denied,

    /// Session could not be serialized or signed
    #[error("Session encoding failed: {0}")]
    Encoding(String),
}

impl AuthError {
    /// Message safe to show on a login form.
    ///
    /// Unknown principals share the invalid-credentials wording so the form
    /// never reveals which accounts exist.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials | AuthError::UnknownPrincipal => {
                "Invalid email or password"
            }
            AuthError::BackendUnavailable | AuthError::Encoding(_) => {
                "Authentication service unavailable, try again"
            }
            AuthError::Decode(_) => "Session expired, please log in again",
            AuthError::Denied => "Access denied",
        }
    }
}

/// Failure reported by a company-profile or admin store
#[derive(Debug, Error)]
#[error("Store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        StoreError(msg.into())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError(format!("{:#}", err))
    }
}

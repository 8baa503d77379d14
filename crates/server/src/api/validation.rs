// Input validation for account APIs
//
// Last-resort limits checked before anything reaches an identity backend.
// These are hard limits, not configurable.

use crate::auth::ApiError;

// =============================================================================
// Input Size Limits
// =============================================================================

/// Maximum e-mail length (RFC 5321 path limit)
pub const MAX_EMAIL_BYTES: usize = 254;

/// Minimum password length accepted at registration or password change.
/// Matches the Supabase Auth default.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Maximum password size. argon2 work grows with input; 1 KB is plenty.
pub const MAX_PASSWORD_BYTES: usize = 1024;

// =============================================================================
// Validation Functions
// =============================================================================

/// Shape check only; the identity backend remains the authority
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || email.len() > MAX_EMAIL_BYTES {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ApiError::bad_request("Invalid email address")),
    }
}

/// Rules for a password being set (not for one being checked)
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters",
        ));
    }
    validate_password_size(password)
}

/// Size guard for any submitted password
pub fn validate_password_size(password: &str) -> Result<(), ApiError> {
    if password.len() > MAX_PASSWORD_BYTES {
        tracing::warn!(
            "Password exceeds limit: {} bytes (max: {})",
            password.len(),
            MAX_PASSWORD_BYTES
        );
        return Err(ApiError::bad_request("Input exceeds allowed limits"));
    }
    Ok(())
}

// Session codec: Principal <-> cookie value
// Decision: Expiry is absolute (issuance + TTL) and embedded in the payload, never sliding
// Decision: Two formats; Plain keeps the legacy unsigned JSON cookie, Signed wraps the
//           same payload in an HS256 JWT
// Decision: Expiry is checked by us with `now < expires_at` (no JWT leeway)

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, DecodeError};
use crate::principal::{Principal, Role};

/// Cookie carrying the session
pub const SESSION_COOKIE_NAME: &str = "user_session";

/// Session lifetime (7 days)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Wire payload of the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionPayload {
    id: String,
    email: String,
    tipo: Role,
    empresa_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    /// Unix timestamp (seconds)
    expires_at: i64,
}

impl SessionPayload {
    fn from_principal(principal: &Principal, expires_at: i64) -> Self {
        Self {
            id: principal.id().to_string(),
            email: principal.email().to_string(),
            tipo: principal.role(),
            empresa_id: principal.empresa_id().map(str::to_string),
            created_at: principal.created_at(),
            updated_at: principal.updated_at(),
            expires_at,
        }
    }

    fn into_principal(self) -> Result<Principal, DecodeError> {
        if self.id.is_empty() {
            return Err(DecodeError::Malformed("empty principal id".to_string()));
        }

        let principal = match self.tipo {
            Role::Company => Principal::company(self.id, self.email, self.empresa_id),
            Role::Admin => {
                if self.empresa_id.is_some() {
                    return Err(DecodeError::InvalidPrincipal);
                }
                Principal::admin(self.id, self.email)
            }
        };

        Ok(principal.with_timestamps(self.created_at, self.updated_at))
    }
}

/// How the payload is carried in the cookie value
#[derive(Clone)]
pub enum SessionFormat {
    /// Raw JSON document, unsigned
    Plain,
    /// HS256 JWT over the same payload
    Signed {
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
    },
}

impl SessionFormat {
    pub fn signed(secret: &[u8]) -> Self {
        SessionFormat::Signed {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SessionFormat::Signed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionFormat::Plain => "plain",
            SessionFormat::Signed { .. } => "signed",
        }
    }
}

impl fmt::Debug for SessionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializes principals into cookie values and back
#[derive(Clone, Debug)]
pub struct SessionCodec {
    ttl: Duration,
    format: SessionFormat,
}

impl SessionCodec {
    pub fn new(ttl: Duration, format: SessionFormat) -> Self {
        Self { ttl, format }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn format(&self) -> &SessionFormat {
        &self.format
    }

    /// Absolute expiry for a session issued at `issued_at`
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> i64 {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        issued_at.timestamp().saturating_add(ttl)
    }

    pub fn encode(&self, principal: &Principal) -> Result<String, AuthError> {
        self.encode_at(principal, Utc::now())
    }

    /// Deterministic for a given principal and issuance instant
    pub fn encode_at(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let payload = SessionPayload::from_principal(principal, self.expires_at(issued_at));

        match &self.format {
            SessionFormat::Plain => {
                serde_json::to_string(&payload).map_err(|e| AuthError::Encoding(e.to_string()))
            }
            SessionFormat::Signed { encoding_key, .. } => {
                jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, encoding_key)
                    .map_err(|e| AuthError::Encoding(e.to_string()))
            }
        }
    }

    pub fn decode(&self, token: &str) -> Result<Principal, DecodeError> {
        self.decode_at(token, Utc::now())
    }

    /// Valid iff the token parses, verifies and `now < expires_at`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::Malformed("empty token".to_string()));
        }

        let payload = match &self.format {
            SessionFormat::Plain => serde_json::from_str::<SessionPayload>(token)
                .map_err(|e| DecodeError::Malformed(e.to_string()))?,
            SessionFormat::Signed { decoding_key, .. } => {
                jsonwebtoken::decode::<SessionPayload>(token, decoding_key, &jwt_validation())
                    .map_err(|e| match e.kind() {
                        ErrorKind::InvalidSignature => DecodeError::InvalidSignature,
                        _ => DecodeError::Malformed(e.to_string()),
                    })?
                    .claims
            }
        };

        if now.timestamp() >= payload.expires_at {
            return Err(DecodeError::Expired);
        }

        payload.into_principal()
    }
}

fn jwt_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry lives in `expires_at` and is checked against the caller's clock
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation.leeway = 0;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn plain() -> SessionCodec {
        SessionCodec::new(DEFAULT_SESSION_TTL, SessionFormat::Plain)
    }

    fn signed() -> SessionCodec {
        SessionCodec::new(
            DEFAULT_SESSION_TTL,
            SessionFormat::signed(b"test-session-secret"),
        )
    }

    fn company() -> Principal {
        Principal::company("u1", "loja@example.com", Some("c1".to_string())).with_timestamps(
            Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2025, 6, 2, 17, 45, 12).unwrap()),
        )
    }

    #[test]
    fn test_round_trip_both_formats() {
        for codec in [plain(), signed()] {
            for principal in [
                company(),
                Principal::admin("u2", "admin@example.com"),
                Principal::company("u3", "nova@example.com", None),
            ] {
                let token = codec.encode_at(&principal, issued()).unwrap();
                let decoded = codec.decode_at(&token, issued()).unwrap();
                assert_eq!(decoded, principal, "format {:?}", codec.format());
            }
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = signed();
        let a = codec.encode_at(&company(), issued()).unwrap();
        let b = codec.encode_at(&company(), issued()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plain_cookie_fields() {
        let token = plain().encode_at(&company(), issued()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&token).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["email"], "loja@example.com");
        assert_eq!(json["tipo"], "empresa");
        assert_eq!(json["empresa_id"], "c1");
        assert!(json["created_at"].is_string());
        assert!(json["updated_at"].is_string());
        assert_eq!(json["expires_at"], issued().timestamp() + 604_800);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = plain();
        let token = codec.encode_at(&company(), issued()).unwrap();
        let expires_at = Utc
            .timestamp_opt(codec.expires_at(issued()), 0)
            .unwrap();

        let one_second_before = expires_at - chrono::Duration::seconds(1);
        assert!(codec.decode_at(&token, one_second_before).is_ok());
        assert_eq!(
            codec.decode_at(&token, expires_at),
            Err(DecodeError::Expired)
        );
        assert_eq!(
            codec.decode_at(&token, expires_at + chrono::Duration::seconds(1)),
            Err(DecodeError::Expired)
        );
    }

    #[test]
    fn test_expiry_is_not_sliding() {
        let codec = plain();
        let token = codec.encode_at(&company(), issued()).unwrap();
        let later = issued() + chrono::Duration::days(3);
        // Decoding does not produce a refreshed token; the same token still dies at issuance + TTL
        assert!(codec.decode_at(&token, later).is_ok());
        assert_eq!(
            codec.decode_at(&token, issued() + chrono::Duration::days(7)),
            Err(DecodeError::Expired)
        );
    }

    #[test]
    fn test_malformed_input() {
        let codec = plain();
        for input in ["", "   ", "not json", "{\"id\":", "[]", "{\"id\":\"u1\"}"] {
            assert!(
                matches!(codec.decode_at(input, issued()), Err(DecodeError::Malformed(_))),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_legacy_cookie_without_expiry_is_rejected() {
        let legacy = r#"{"id":"u1","email":"loja@example.com","tipo":"empresa","empresa_id":"c1","created_at":null,"updated_at":null}"#;
        assert!(matches!(
            plain().decode_at(legacy, issued()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let token = format!(
            r#"{{"id":"u1","email":"x@example.com","tipo":"superuser","empresa_id":null,"created_at":null,"updated_at":null,"expires_at":{}}}"#,
            issued().timestamp() + 60
        );
        assert!(matches!(
            plain().decode_at(&token, issued()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_admin_with_company_link_is_rejected() {
        let token = format!(
            r#"{{"id":"u2","email":"admin@example.com","tipo":"admin","empresa_id":"c1","created_at":null,"updated_at":null,"expires_at":{}}}"#,
            issued().timestamp() + 60
        );
        assert_eq!(
            plain().decode_at(&token, issued()),
            Err(DecodeError::InvalidPrincipal)
        );
    }

    #[test]
    fn test_signed_rejects_foreign_secret() {
        let other = SessionCodec::new(DEFAULT_SESSION_TTL, SessionFormat::signed(b"other"));
        let token = other.encode_at(&company(), issued()).unwrap();
        assert_eq!(
            signed().decode_at(&token, issued()),
            Err(DecodeError::InvalidSignature)
        );
    }

    #[test]
    fn test_signed_rejects_plain_json() {
        let token = plain().encode_at(&company(), issued()).unwrap();
        assert!(matches!(
            signed().decode_at(&token, issued()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_signed_token_expiry_checked() {
        let codec = signed();
        let token = codec.encode_at(&company(), issued()).unwrap();
        let past_expiry = issued() + chrono::Duration::days(8);
        assert_eq!(codec.decode_at(&token, past_expiry), Err(DecodeError::Expired));
    }
}

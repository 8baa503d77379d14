// Supabase Auth (GoTrue) identity backend
// Decision: Service-role key for admin endpoints; anon-style password grant for login
// Decision: 400/401/422 on password grant => InvalidCredentials, transport and 5xx => Unavailable
// Decision: 10s client timeout; no retries

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use vitrine_core::{normalize_email, IdentityBackend, IdentityError, VerifiedIdentity};

use super::config::SupabaseConfig;
use crate::storage::parse_identity_id;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateUser<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Debug, Default, Serialize)]
struct UpdateUser<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_confirm: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl GoTrueUser {
    fn into_identity(self, fallback_email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            id: self.id,
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: GoTrueUser,
}

pub struct GoTrueIdentityBackend {
    config: SupabaseConfig,
    client: Client,
}

impl GoTrueIdentityBackend {
    pub fn new(config: SupabaseConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.url.trim_end_matches('/'), path)
    }

    /// Admin endpoint for one user; GoTrue ids are UUIDs, anything else never reaches the URL
    fn user_url(&self, identity_id: &str) -> Result<String, IdentityError> {
        let id = parse_identity_id(identity_id).ok_or_else(|| {
            tracing::warn!(identity_id = %identity_id, "Refusing non-UUID Supabase user id");
            IdentityError::NotFound
        })?;
        Ok(self.url(&format!("/admin/users/{}", id)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response, IdentityError> {
        self.authorized(request).send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Supabase Auth request failed");
            IdentityError::Unavailable(e.to_string())
        })
    }

    async fn read_user(response: Response, fallback_email: &str) -> Result<VerifiedIdentity, IdentityError> {
        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("unexpected Supabase Auth response: {}", e)))?;
        Ok(user.into_identity(fallback_email))
    }
}

/// Errors shared by every endpoint: 5xx and anything unexpected is Unavailable
async fn unexpected(response: Response, operation: &str) -> IdentityError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(operation, status = %status, body = %body, "Supabase Auth returned an error");
    IdentityError::Unavailable(format!("Supabase Auth {} returned {}", operation, status))
}

#[async_trait]
impl IdentityBackend for GoTrueIdentityBackend {
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let email = normalize_email(email);
        let request = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email: &email,
                password,
            });
        let response = self.send(request, "password_grant").await?;

        match response.status() {
            s if s.is_success() => {
                let token: TokenResponse = response.json().await.map_err(|e| {
                    IdentityError::Unavailable(format!("unexpected Supabase Auth response: {}", e))
                })?;
                Ok(token.user.into_identity(&email))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(IdentityError::InvalidCredentials)
            }
            _ => Err(unexpected(response, "password_grant").await),
        }
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let email = normalize_email(email);
        let request = self.client.post(self.url("/admin/users")).json(&CreateUser {
            email: &email,
            password,
            email_confirm: true,
        });
        let response = self.send(request, "create_user").await?;

        match response.status() {
            s if s.is_success() => Self::read_user(response, &email).await,
            StatusCode::UNPROCESSABLE_ENTITY => Err(IdentityError::AlreadyExists),
            _ => Err(unexpected(response, "create_user").await),
        }
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError> {
        let request = self.client.delete(self.user_url(identity_id)?);
        let response = self.send(request, "delete_user").await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            _ => Err(unexpected(response, "delete_user").await),
        }
    }

    async fn update_email(
        &self,
        identity_id: &str,
        new_email: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let email = normalize_email(new_email);
        let request = self
            .client
            .put(self.user_url(identity_id)?)
            .json(&UpdateUser {
                email: Some(&email),
                email_confirm: Some(true),
                ..Default::default()
            });
        let response = self.send(request, "update_email").await?;

        match response.status() {
            s if s.is_success() => Self::read_user(response, &email).await,
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            StatusCode::UNPROCESSABLE_ENTITY => Err(IdentityError::AlreadyExists),
            _ => Err(unexpected(response, "update_email").await),
        }
    }

    async fn update_password(
        &self,
        identity_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let request = self
            .client
            .put(self.user_url(identity_id)?)
            .json(&UpdateUser {
                password: Some(new_password),
                ..Default::default()
            });
        let response = self.send(request, "update_password").await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            _ => Err(unexpected(response, "update_password").await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "service-role-key";

    fn backend(server: &MockServer) -> GoTrueIdentityBackend {
        GoTrueIdentityBackend::new(SupabaseConfig {
            url: server.uri(),
            service_role_key: KEY.to_string(),
        })
        .unwrap()
    }

    fn user_json(id: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "aud": "authenticated",
            "email": email,
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-02T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_password_grant_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", KEY))
            .and(body_json(json!({"email": "loja@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt",
                "token_type": "bearer",
                "user": user_json("uid-1", "loja@example.com")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let identity = backend(&server)
            .verify_password(" Loja@Example.com", "pw")
            .await
            .unwrap();
        assert_eq!(identity.id, "uid-1");
        assert_eq!(identity.email, "loja@example.com");
        assert!(identity.created_at.is_some());
    }

    #[tokio::test]
    async fn test_password_grant_rejections_are_invalid_credentials() {
        for status in [400, 401, 422] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/auth/v1/token"))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                })))
                .mount(&server)
                .await;

            let err = backend(&server)
                .verify_password("loja@example.com", "wrong")
                .await
                .unwrap_err();
            assert_eq!(err, IdentityError::InvalidCredentials, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend(&server)
            .verify_password("loja@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let backend = GoTrueIdentityBackend::new(SupabaseConfig {
            url: "http://127.0.0.1:1".to_string(),
            service_role_key: KEY.to_string(),
        })
        .unwrap();

        let err = backend
            .verify_password("loja@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_create_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(header("authorization", "Bearer service-role-key"))
            .and(body_json(json!({
                "email": "nova@example.com",
                "password": "pw",
                "email_confirm": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("uid-2", "nova@example.com")))
            .mount(&server)
            .await;

        let identity = backend(&server)
            .create_identity("nova@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(identity.id, "uid-2");
    }

    #[tokio::test]
    async fn test_create_identity_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "email_exists",
                "msg": "A user with this email address has already been registered"
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .create_identity("nova@example.com", "pw")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::AlreadyExists);
    }

    const USER_ID: &str = "0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c01";
    const MISSING_ID: &str = "0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c02";

    #[tokio::test]
    async fn test_update_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/v1/admin/users/0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c01"))
            .and(body_json(json!({"email": "novo@example.com", "email_confirm": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(USER_ID, "novo@example.com")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/auth/v1/admin/users/0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c01"))
            .and(body_json(json!({"password": "nova-senha"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(USER_ID, "novo@example.com")))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/0190f3c2-7b1a-7c3e-9a10-5d2f4e6b8c02"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let updated = backend.update_email(USER_ID, "Novo@example.com").await.unwrap();
        assert_eq!(updated.email, "novo@example.com");
        backend.update_password(USER_ID, "nova-senha").await.unwrap();
        backend.delete_identity(USER_ID).await.unwrap();
        assert_eq!(
            backend.delete_identity(MISSING_ID).await.unwrap_err(),
            IdentityError::NotFound
        );
    }

    #[tokio::test]
    async fn test_user_id_never_escapes_its_path_segment() {
        let server = MockServer::start().await;
        // Nothing may be sent for a malformed id
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend(&server);
        for id in ["../../rest/v1/empresas", "uid-1/../other", ""] {
            assert_eq!(backend.delete_identity(id).await.unwrap_err(), IdentityError::NotFound);
            assert_eq!(
                backend.update_password(id, "nova-senha").await.unwrap_err(),
                IdentityError::NotFound
            );
            assert_eq!(
                backend.update_email(id, "x@example.com").await.unwrap_err(),
                IdentityError::NotFound
            );
        }
    }
}

// Route guard middleware and session extractors
// Decision: The guard only ever allows or redirects (303); it never fails a request
// Decision: Allowed protected requests carry the decoded Principal in request extensions
// Decision: AdminUser re-resolves the role against the stores instead of trusting the cookie,
// and redirects (never a JSON error) when that fails

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use vitrine_core::guard::{ADMIN_LOGIN_PATH, LOGIN_PATH};
use vitrine_core::{
    AuthError, GuardDecision, IdentityBackend, IdentityError, LoginService, Principal, Role,
    RoleGrant, RoleResolver, RouteGuard,
};

use super::{config::AuthConfig, cookies::SessionCookies};
use crate::storage::StorageBackend;

/// HTTP error body for auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            error: message.to_string(),
            status,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unavailable(message: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::InvalidCredentials | AuthError::UnknownPrincipal | AuthError::Decode(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Denied => StatusCode::FORBIDDEN,
            AuthError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.user_message())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => AuthError::InvalidCredentials.into(),
            IdentityError::AlreadyExists => Self::conflict("Email already registered"),
            IdentityError::NotFound => Self::not_found("Account not found"),
            IdentityError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Identity backend unavailable");
                AuthError::BackendUnavailable.into()
            }
        }
    }
}

/// Auth state shared across routes and the guard middleware
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub login: LoginService,
    pub guard: RouteGuard,
    pub cookies: SessionCookies,
    pub storage: StorageBackend,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        storage: StorageBackend,
        identity_backend: Arc<dyn IdentityBackend>,
    ) -> Self {
        let codec = config.session_codec();
        let resolver = RoleResolver::standard(Arc::new(storage.clone()), Arc::new(storage.clone()));
        Self {
            guard: RouteGuard::new(codec.clone()),
            cookies: SessionCookies::new(codec, config.secure_cookies),
            login: LoginService::new(identity_backend, resolver),
            config: Arc::new(config),
            storage,
        }
    }

    pub fn identity_backend(&self) -> &Arc<dyn IdentityBackend> {
        self.login.identity_backend()
    }
}

/// Route guard, applied with `axum::middleware::from_fn_with_state`
pub async fn guard_layer(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = state.cookies.read(&jar);
    let decision = state.guard.evaluate(request.uri().path(), token.as_deref());

    match decision {
        GuardDecision::Allow { principal } => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        GuardDecision::Redirect { to, clear_cookie } => {
            if clear_cookie {
                (state.cookies.revoke(jar), Redirect::to(to)).into_response()
            } else {
                Redirect::to(to).into_response()
            }
        }
    }
}

/// Principal of the current session
///
/// Uses the principal the guard already decoded when present, otherwise decodes
/// the cookie itself (for routes outside the guarded prefixes, e.g. `/api/auth/me`).
#[derive(Debug, Clone)]
pub struct SessionUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(SessionUser(principal.clone()));
        }

        let auth_state = AuthState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = auth_state
            .cookies
            .read(&jar)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let principal = auth_state.cookies.codec().decode(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejecting unusable session cookie");
            ApiError::from(AuthError::Decode(e))
        })?;
        Ok(SessionUser(principal))
    }
}

/// Session principal whose admin row still exists
///
/// Rejects the way the guard does, with a 303: a session that no longer maps to
/// an admin record is cleared and sent to /admin/login.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

fn admin_redirect(state: &AuthState, jar: CookieJar, to: &str, clear_cookie: bool) -> Response {
    if clear_cookie {
        (state.cookies.revoke(jar), Redirect::to(to)).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let principal = match SessionUser::from_request_parts(parts, state).await {
            Ok(SessionUser(principal)) => principal,
            Err(_) => return Err(admin_redirect(&auth_state, jar, ADMIN_LOGIN_PATH, true)),
        };
        if principal.role() != Role::Admin {
            return Err(admin_redirect(&auth_state, jar, LOGIN_PATH, false));
        }

        match auth_state.login.resolver().resolve(principal.id()).await {
            Ok(RoleGrant::Admin) => Ok(AdminUser(principal)),
            Ok(_) | Err(AuthError::UnknownPrincipal) => {
                tracing::warn!(
                    identity_id = %principal.id(),
                    "Admin session no longer backed by an admin record"
                );
                Err(admin_redirect(&auth_state, jar, ADMIN_LOGIN_PATH, true))
            }
            Err(e) => {
                tracing::error!(identity_id = %principal.id(), error = %e, "Admin re-validation failed");
                Err(admin_redirect(&auth_state, jar, ADMIN_LOGIN_PATH, false))
            }
        }
    }
}

// Authentication HTTP routes
// Decision: /api/auth/* paths, JSON bodies, cookie-based sessions
// Decision: Login and register answer with the principal and the page to land on
// Decision: Account routes (update-email, update-password, delete-account) sit behind the guard

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vitrine_core::{landing_path, AuthError, IdentityError, Principal};

use super::middleware::{ApiError, AuthState, SessionUser};
use crate::api::{
    validation::{validate_email, validate_new_password, validate_password_size},
    ErrorResponse, PrincipalResponse,
};
use crate::storage::parse_identity_id;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Update e-mail request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// Update password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Session response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user: PrincipalResponse,
    /// Where the client should navigate next
    #[schema(example = "/dashboard")]
    pub redirect_to: String,
}

impl SessionResponse {
    fn for_principal(principal: &Principal) -> Self {
        Self {
            user: principal.into(),
            redirect_to: landing_path(principal).to_string(),
        }
    }
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        // Public routes
        .route("/api/auth/login", post(login))
        .route("/api/auth/admin/login", post(admin_login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(get_current_user))
        // Guarded account routes
        .route("/api/auth/update-email", post(update_email))
        .route("/api/auth/update-password", post(update_password))
        .route("/api/auth/delete-account", post(delete_account))
        .with_state(state)
}

fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    validate_password_size(&req.password)?;
    if req.email.len() > crate::api::validation::MAX_EMAIL_BYTES {
        return Err(AuthError::InvalidCredentials.into());
    }
    Ok(())
}

/// POST /api/auth/login - Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie issued", body = SessionResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    validate_login(&req)?;
    let principal = state.login.login(&req.email, &req.password).await?;
    let jar = state.cookies.issue(jar, &principal)?;
    Ok((jar, Json(SessionResponse::for_principal(&principal))))
}

/// POST /api/auth/admin/login - Login restricted to administrators
#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie issued", body = SessionResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn admin_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    validate_login(&req)?;
    let principal = state.login.login(&req.email, &req.password).await?;
    if !principal.is_admin() {
        tracing::warn!(identity_id = %principal.id(), "Non-admin attempted admin login");
        return Err(AuthError::Denied.into());
    }
    let jar = state.cookies.issue(jar, &principal)?;
    Ok((jar, Json(SessionResponse::for_principal(&principal))))
}

/// POST /api/auth/register - Register a company account
///
/// Creates the identity and an empty company profile; the company record is
/// linked later, so the new session lands on /cadastro.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie issued", body = SessionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Registration disabled", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), ApiError> {
    if state.config.disable_signup {
        return Err(ApiError::forbidden("Registration is disabled"));
    }
    validate_email(&req.email)?;
    validate_new_password(&req.password)?;

    let backend = state.identity_backend();
    let identity = backend.create_identity(&req.email, &req.password).await?;

    let Some(user_id) = parse_identity_id(&identity.id) else {
        tracing::error!(identity_id = %identity.id, "Identity backend returned a non-UUID id");
        rollback_identity(&state, &identity.id).await;
        return Err(ApiError::internal("Registration failed"));
    };

    if let Err(e) = state.storage.create_perfil_empresa(user_id, None).await {
        tracing::error!(identity_id = %user_id, error = %e, "Failed to create company profile");
        rollback_identity(&state, &identity.id).await;
        return Err(AuthError::BackendUnavailable.into());
    }

    let principal = state.login.principal_for(identity).await?;
    tracing::info!(identity_id = %principal.id(), "Company account registered");

    let jar = state.cookies.issue(jar, &principal)?;
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse::for_principal(&principal)),
    ))
}

async fn rollback_identity(state: &AuthState, identity_id: &str) {
    if let Err(e) = state.identity_backend().delete_identity(identity_id).await {
        tracing::error!(
            identity_id = %identity_id,
            error = %e,
            "Failed to roll back identity after registration error"
        );
    }
}

/// POST /api/auth/logout - Logout (clear the session cookie)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookie removed")),
    tag = "auth"
)]
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, state.cookies.revoke(jar))
}

/// GET /api/auth/me - Get the current principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal", body = PrincipalResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(SessionUser(principal): SessionUser) -> Json<PrincipalResponse> {
    Json((&principal).into())
}

/// POST /api/auth/update-email - Change the account e-mail
///
/// The role is resolved again and a fresh cookie replaces the old one.
#[utoipa::path(
    post,
    path = "/api/auth/update-email",
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "E-mail updated, session re-issued", body = SessionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn update_email(
    State(state): State<AuthState>,
    SessionUser(principal): SessionUser,
    jar: CookieJar,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    validate_email(&req.email)?;

    let identity = state
        .identity_backend()
        .update_email(principal.id(), &req.email)
        .await?;
    let updated = state.login.principal_for(identity).await?;
    tracing::info!(identity_id = %updated.id(), "Account e-mail updated");

    let jar = state.cookies.issue(jar, &updated)?;
    Ok((jar, Json(SessionResponse::for_principal(&updated))))
}

/// POST /api/auth/update-password - Change the account password
#[utoipa::path(
    post,
    path = "/api/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn update_password(
    State(state): State<AuthState>,
    SessionUser(principal): SessionUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password_size(&req.current_password)?;
    validate_new_password(&req.new_password)?;

    let verified = match state
        .login
        .verifier()
        .verify(principal.email(), &req.current_password)
        .await
    {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            return Err(ApiError::unauthorized("Current password is incorrect"))
        }
        Err(e) => return Err(e.into()),
    };
    if verified.id != principal.id() {
        tracing::warn!(identity_id = %principal.id(), "Session e-mail now belongs to another identity");
        return Err(AuthError::Denied.into());
    }

    state
        .identity_backend()
        .update_password(principal.id(), &req.new_password)
        .await?;
    tracing::info!(identity_id = %principal.id(), "Account password updated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/delete-account - Delete the account and end the session
#[utoipa::path(
    post,
    path = "/api/auth/delete-account",
    responses(
        (status = 204, description = "Account deleted, session cookie removed"),
        (status = 503, description = "Identity backend unavailable", body = ErrorResponse)
    ),
    tag = "account"
)]
pub async fn delete_account(
    State(state): State<AuthState>,
    SessionUser(principal): SessionUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ApiError> {
    match state.identity_backend().delete_identity(principal.id()).await {
        Ok(()) => {}
        Err(IdentityError::NotFound) => {
            tracing::info!(identity_id = %principal.id(), "Identity already gone");
        }
        Err(e) => return Err(e.into()),
    }

    // The local backend cascades; Supabase identities live outside our database
    if let Some(user_id) = parse_identity_id(principal.id()) {
        if let Err(e) = state.storage.delete_perfil_empresa(user_id).await {
            tracing::error!(identity_id = %user_id, error = %e, "Failed to delete company profile");
        }
    }

    tracing::info!(identity_id = %principal.id(), "Account deleted");
    Ok((StatusCode::NO_CONTENT, state.cookies.revoke(jar)))
}

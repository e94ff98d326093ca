//! Authentication service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use common::{
    jwt::TokenType,
    mail::OutgoingMail,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use social::{
    credentials::{hash_password, password_fingerprint, verify_password},
    models::Identity,
    provisioning::create_identity,
    store::SocialStore,
    validation::{RegistrationForm, normalize_email, validate_password_pair},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    emails::{activation_mail, password_reset_mail},
    error::{AuthError, AuthResult},
    state::AppState,
};

/// Response for token generation
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

/// Response for a successful registration
#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub id: Uuid,
    pub username: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password1: String,
    pub password2: String,
}

/// Create the router for the authentication service
pub fn create_router<S: SocialStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register::<S>))
        .route("/auth/activate/:token", get(activate::<S>))
        .route("/auth/login", post(login::<S>))
        .route("/auth/password-reset", post(request_password_reset::<S>))
        .route(
            "/auth/password-reset/confirm",
            post(confirm_password_reset::<S>),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Hand a mail to the queue; delivery problems never fail the request
async fn send_mail<S: SocialStore>(state: &AppState<S>, mail: OutgoingMail) {
    if let Err(e) = state.mail.enqueue(mail).await {
        error!("Failed to enqueue mail: {}", e);
    }
}

/// Register a new, inactive account and mail its activation link
pub async fn register<S: SocialStore>(
    State(state): State<AppState<S>>,
    Json(form): Json<RegistrationForm>,
) -> AuthResult<impl IntoResponse> {
    info!("Registration attempt for user: {}", form.username);

    form.validate()?;
    let provisioned =
        create_identity(&state.store, &form.username, &form.email, &form.password1).await?;
    let identity = provisioned.identity;

    match state.jwt.generate_activation_token(identity.id) {
        Ok(token) => {
            let mail = activation_mail(&state.config, &identity, &token);
            send_mail(&state, mail).await;
        }
        Err(e) => error!("Failed to generate activation token: {}", e),
    }

    let response = RegisteredResponse {
        id: identity.id,
        username: identity.username,
        slug: provisioned.profile.slug,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Activate the account an activation link was issued for
pub async fn activate<S: SocialStore>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> AuthResult<impl IntoResponse> {
    let claims = state
        .jwt
        .validate_token(&token, TokenType::Activation)
        .map_err(|e| {
            warn!("Rejected activation token: {}", e);
            AuthError::BadRequest("Invalid or expired activation link".to_string())
        })?;

    if !state.store.activate_identity(claims.sub).await? {
        return Err(AuthError::NotFound("Account not found".to_string()));
    }

    info!("Identity {} activated", claims.sub);
    Ok(Json(json!({ "activated": true })))
}

/// Accounts a login string may refer to
///
/// Usernames may contain `@`, so the account named by the login and the
/// account owning it as an email can be two different identities.
async fn login_candidates<S: SocialStore>(
    state: &AppState<S>,
    login: &str,
) -> AuthResult<Vec<Identity>> {
    let mut candidates = Vec::new();
    if let Some(identity) = state.store.find_identity_by_username(login).await? {
        candidates.push(identity);
    }

    // Emails are stored with a lower-cased domain
    if let Ok(email) = normalize_email(login) {
        if let Some(identity) = state.store.find_identity_by_email(&email).await? {
            if candidates.iter().all(|candidate| candidate.id != identity.id) {
                candidates.push(identity);
            }
        }
    }

    Ok(candidates)
}

fn identity_key(id: Uuid) -> String {
    format!("identity:{}", id)
}

/// Rate limiter keys for a login attempt
///
/// Every spelling that reaches an account shares that account's budget.
fn limiter_keys(login: &str, candidates: &[Identity]) -> Vec<String> {
    if candidates.is_empty() {
        return vec![format!("login:{}", login.trim().to_lowercase())];
    }
    candidates
        .iter()
        .map(|identity| identity_key(identity.id))
        .collect()
}

/// User login endpoint
pub async fn login<S: SocialStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    info!("Login attempt for user: {}", payload.username);

    let candidates = login_candidates(&state, &payload.username).await?;

    let mut allowed = true;
    for key in limiter_keys(&payload.username, &candidates) {
        allowed &= state.rate_limiter.is_allowed(&key).await;
    }
    if !allowed {
        warn!("Login attempts exhausted for user: {}", payload.username);
        return Err(AuthError::TooManyRequests);
    }

    let mut authenticated = None;
    for identity in candidates {
        if verify_password(&identity.password_hash, &payload.password)? {
            authenticated = Some(identity);
            break;
        }
    }
    let identity = authenticated.ok_or(AuthError::Unauthorized)?;

    if !identity.is_active {
        return Err(AuthError::Forbidden(
            "Account is not activated yet".to_string(),
        ));
    }

    state.rate_limiter.reset(&identity_key(identity.id)).await;

    let access_token = state.jwt.generate_access_token(identity.id).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        AuthError::InternalServerError
    })?;

    let response = TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.access_token_expiry(),
    };

    Ok(Json(response))
}

/// Mail a password reset link to an active account
///
/// Answers the same whether or not the email is known.
pub async fn request_password_reset<S: SocialStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<PasswordResetRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email)?;

    match state.store.find_identity_by_email(&email).await? {
        Some(identity) if identity.is_active => {
            let fingerprint = password_fingerprint(&identity);
            match state
                .jwt
                .generate_password_reset_token(identity.id, &fingerprint)
            {
                Ok(token) => {
                    let mail = password_reset_mail(&state.config, &identity, &token);
                    send_mail(&state, mail).await;
                }
                Err(e) => error!("Failed to generate password reset token: {}", e),
            }
        }
        _ => info!("Password reset requested for an unknown or inactive account"),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "If an active account uses this email, a reset link has been sent"
        })),
    ))
}

/// Store a new password using a reset link
pub async fn confirm_password_reset<S: SocialStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<PasswordResetConfirm>,
) -> AuthResult<impl IntoResponse> {
    let invalid_link = || AuthError::BadRequest("Invalid or expired reset link".to_string());

    let claims = state
        .jwt
        .validate_token(&payload.token, TokenType::PasswordReset)
        .map_err(|e| {
            warn!("Rejected password reset token: {}", e);
            invalid_link()
        })?;

    validate_password_pair(&payload.password1, &payload.password2)?;

    let identity = state
        .store
        .find_identity_by_id(claims.sub)
        .await?
        .ok_or_else(invalid_link)?;

    // The fingerprint changes with the password, so each link works once
    if claims.fp.as_deref() != Some(password_fingerprint(&identity).as_str()) {
        warn!("Password reset link reused for identity {}", identity.id);
        return Err(invalid_link());
    }

    let password_hash = hash_password(&payload.password1)?;
    state
        .store
        .set_password_hash(identity.id, &password_hash)
        .await?;

    info!("Password reset for identity {}", identity.id);
    Ok(Json(json!({ "message": "Password updated" })))
}

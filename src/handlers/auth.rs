use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::handlers::{validate_required, ApiJson};
use crate::middlewares::AuthUser;
use crate::models::{CreateUser, User, UserResponse};
use crate::repositories::user::normalize_email;
use crate::repositories::{Repository, UserRepository};
use crate::services::AuthService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

const MIN_PASSWORD_LEN: usize = 8;

impl RegisterRequest {
    /// Normalized account fields, or the first validation failure
    fn to_new_user(&self) -> AppResult<CreateUser> {
        let email = normalize_email(&self.email);
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        validate_required(&self.name, "Name", 100)?;

        Ok(CreateUser {
            email,
            name: self.name.trim().to_string(),
        })
    }
}

fn session_for(user: User, config: &Config) -> AppResult<AuthResponse> {
    let token = AuthService::generate_token(user.id, &user.email, config)?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

// ============ Handlers ============

/// Create an account and start a session. New accounts are on the Free plan.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 400, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let new_user = payload.to_new_user()?;
    let password_hash = AuthService::hash_password(&payload.password)?;

    let user = UserRepository::create(&state.db, &new_user, &password_hash).await?;
    tracing::info!(user_id = %user.id, "Collector registered");

    Ok(Json(session_for(user, &state.config)?))
}

/// Start a session. Unknown emails and wrong passwords are both 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session started", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = match UserRepository::find_by_email(&state.db, &payload.email).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e),
    };

    AuthService::verify_password(&payload.password, &user.password_hash)?;
    tracing::debug!(user_id = %user.id, "Session started");

    Ok(Json(session_for(user, &state.config)?))
}

/// Profile of the session's user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user info", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user_data = UserRepository::find_by_id(&state.db, user.id).await?;
    Ok(Json(user_data.into()))
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse, RegisterRequest},
    password,
    repo::NewUser,
    repo_types::User,
    role::Role,
};
use crate::{
    error::{method_not_allowed, ApiError},
    response::Envelope,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login).fallback(method_not_allowed))
        .route("/auth/register", post(register).fallback(method_not_allowed))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthenticated("Invalid credentials".into())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let (Some(email), Some(plain)) = (present(payload.email), present(payload.password)) else {
        return Err(ApiError::Validation("email and password are required".into()));
    };

    let Some(user) = User::find_by_email(state.store.as_ref(), &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };

    if !password::verify_password(&plain, &user.password) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let identity = user.identity();
    let token = state.jwt.issue(&identity)?;

    info!(user_id = %identity.id, role = %identity.role, "user logged in");
    Ok(Json(LoginResponse {
        ok: true,
        token,
        user: identity,
    }))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<User>>), ApiError> {
    let Json(payload) = payload?;
    let (Some(email), Some(plain), Some(name)) = (
        present(payload.email),
        present(payload.password),
        present(payload.name),
    ) else {
        return Err(ApiError::Validation(
            "email, password and name are required".into(),
        ));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Open registration: callers may pick any known role.
    let role = match present(payload.role) {
        None => Role::Staff,
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| ApiError::Validation(e.to_string()))?,
    };

    if User::find_by_email(state.store.as_ref(), &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let stored_password = password::for_storage(state.config.password_scheme, &plain)?;
    let user = User::create(
        state.store.as_ref(),
        NewUser {
            email: &email,
            password: &stored_password,
            name: &name,
            role,
        },
    )
    .await?;

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, Json(Envelope::created(user.id.clone(), user))))
}

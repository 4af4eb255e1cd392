use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::PublicUser;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<Value>> {
    let username = req.username.trim();
    let email = req.email.trim();

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username, email and password are required".to_string(),
        ));
    }

    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(AppError::Conflict("Username is already taken".to_string()));
    }
    if state.store.get_user_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let hash = state.auth.hash_password(&req.password)?;
    let user = state.store.create_user(username, email, &hash).await?;
    let token = state.auth.issue_token(user.id, &user.username)?;

    tracing::info!(user_id = user.id, "registered user {}", user.username);

    Ok(Json(json!({
        "token": token,
        "user": PublicUser::from(&user)
    })))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let user = state
        .store
        .get_user_by_email(req.email.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !state.auth.verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.auth.issue_token(user.id, &user.username)?;

    Ok(Json(json!({
        "token": token,
        "user": PublicUser::from(&user)
    })))
}

pub async fn me_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .get_user(viewer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;

    // The owner sees their own email; nobody else ever does
    Ok(Json(json!({
        "user": PublicUser::from(&user),
        "email": user.email
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/me", get(me_handler))
}

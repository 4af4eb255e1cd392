use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Profile, PublicUser};
use crate::store::ProfileUpdate;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i32>,
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Profile>> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    let is_following = match &viewer {
        Some(viewer) => state.store.is_following(viewer.id, id).await?,
        None => false,
    };

    Ok(Json(Profile {
        user: PublicUser::from(&user),
        follower_count: state.store.follower_count(id).await?,
        following_count: state.store.following_count(id).await?,
        post_count: state.store.post_count(id).await?,
        is_following,
    }))
}

pub async fn search_users_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Value>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::Validation("q must not be empty".to_string()));
    }

    let limit = params.limit.unwrap_or(20).clamp(1, 50);
    let users = state.store.search_users(query, limit).await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();

    Ok(Json(json!({ "users": users })))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    if viewer.id != id {
        return Err(AppError::Forbidden(
            "Cannot edit another user's profile".to_string(),
        ));
    }

    let user = state
        .store
        .update_profile(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(json!({ "user": PublicUser::from(&user) })))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if viewer.id != id {
        return Err(AppError::Forbidden(
            "Cannot delete another user's account".to_string(),
        ));
    }

    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }

    tracing::info!(user_id = id, "deleted account");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_users_handler))
        .route(
            "/{id}",
            get(get_profile_handler)
                .put(update_profile_handler)
                .delete(delete_user_handler),
        )
}

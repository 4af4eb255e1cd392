use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Paging;
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::PostView;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub caption: String,
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let caption = req.caption.trim();
    if caption.is_empty() && req.media_urls.is_empty() {
        return Err(AppError::Validation(
            "A post needs a caption or at least one media file".to_string(),
        ));
    }

    let post = state
        .store
        .create_post(viewer.id, caption, &req.media_urls)
        .await?;

    tracing::info!(post_id = post.id, author_id = viewer.id, "created post");

    let views = state.store.hydrate_posts(viewer.id, vec![post]).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;
    Ok((StatusCode::CREATED, Json(json!({ "post": view }))))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let post = state
        .store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    let viewer_id = viewer.map(|v| v.id).unwrap_or(0);
    let views = state.store.hydrate_posts(viewer_id, vec![post]).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    Ok(Json(json!({ "post": view })))
}

pub async fn feed_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Query(paging): Query<Paging>,
) -> AppResult<Json<Value>> {
    let posts = state
        .store
        .feed(viewer.id, paging.limit(), paging.offset())
        .await?;
    let views = state.store.hydrate_posts(viewer.id, posts).await?;

    Ok(Json(json!({ "posts": views })))
}

pub async fn user_posts_handler(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(user_id): Path<i64>,
    Query(paging): Query<Paging>,
) -> AppResult<Json<Value>> {
    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let posts = state
        .store
        .posts_by_user(user_id, paging.limit(), paging.offset())
        .await?;

    let viewer_id = viewer.map(|v| v.id).unwrap_or(0);
    let views = state.store.hydrate_posts(viewer_id, posts).await?;

    Ok(Json(json!({ "posts": views })))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<Json<Value>> {
    let caption = req.caption.trim();
    if caption.is_empty() {
        return Err(AppError::Validation("caption must not be empty".to_string()));
    }

    let post = state
        .store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if post.author_id != viewer.id {
        return Err(AppError::Forbidden(
            "Cannot edit another user's post".to_string(),
        ));
    }

    let updated = state
        .store
        .update_caption(id, caption)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    let views: Vec<PostView> = state.store.hydrate_posts(viewer.id, vec![updated]).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;
    Ok(Json(json!({ "post": view })))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let post = state
        .store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if post.author_id != viewer.id {
        return Err(AppError::Forbidden(
            "Cannot delete another user's post".to_string(),
        ));
    }

    state.store.delete_post(id).await?;
    tracing::info!(post_id = id, "deleted post");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post_handler))
        .route("/feed", get(feed_handler))
        .route("/user/{id}", get(user_posts_handler))
        .route(
            "/{id}",
            get(get_post_handler)
                .put(update_post_handler)
                .delete(delete_post_handler),
        )
}

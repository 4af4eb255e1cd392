use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::NotificationKind;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub text: String,
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let post = state
        .store
        .get_post(req.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", req.post_id)))?;

    let comment = state
        .store
        .create_comment(post.id, viewer.id, text)
        .await?;

    state
        .store
        .create_notification(post.author_id, viewer.id, NotificationKind::Comment, Some(post.id))
        .await?;

    let views = state.store.hydrate_comments(viewer.id, vec![comment]).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": view }))))
}

pub async fn post_comments_handler(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.store.get_post(post_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }

    let comments = state.store.comments_for_post(post_id).await?;
    let viewer_id = viewer.map(|v| v.id).unwrap_or(0);
    let views = state.store.hydrate_comments(viewer_id, comments).await?;

    Ok(Json(json!({ "comments": views })))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let comment = state
        .store
        .get_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

    // The comment's author or the owner of the commented post may delete it
    let post_owner = state
        .store
        .get_post(comment.post_id)
        .await?
        .map(|post| post.author_id);

    if comment.author_id != viewer.id && post_owner != Some(viewer.id) {
        return Err(AppError::Forbidden(
            "Not allowed to delete this comment".to_string(),
        ));
    }

    state.store.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment_handler))
        .route("/post/{id}", get(post_comments_handler))
        .route("/{id}", axum::routing::delete(delete_comment_handler))
}

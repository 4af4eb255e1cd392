// Follow, like, and save endpoints - the toggle edges of the social graph.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{LikeSubject, NotificationKind, PublicUser};

pub async fn toggle_follow_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if user_id == viewer.id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }

    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let following = state.store.toggle_follow(viewer.id, user_id).await?;

    if following {
        state
            .store
            .create_notification(user_id, viewer.id, NotificationKind::Follow, None)
            .await?;
    }

    Ok(Json(json!({
        "following": following,
        "follower_count": state.store.follower_count(user_id).await?
    })))
}

pub async fn followers_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let users = state.store.followers_of(user_id).await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(json!({ "users": users })))
}

pub async fn following_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let users = state.store.following_of(user_id).await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(json!({ "users": users })))
}

pub async fn toggle_like_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path((subject_type, subject_id)): Path<(String, i64)>,
) -> AppResult<Json<Value>> {
    let subject = LikeSubject::parse(&subject_type)
        .ok_or_else(|| AppError::Validation(format!("Unknown like subject: {}", subject_type)))?;

    // Resolve the liked thing both to 404 early and to know whom to notify
    let notify = match subject {
        LikeSubject::Post => {
            let post = state
                .store
                .get_post(subject_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Post {} not found", subject_id)))?;
            Some((post.author_id, Some(post.id)))
        }
        LikeSubject::Comment => {
            let comment = state
                .store
                .get_comment(subject_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", subject_id)))?;
            Some((comment.author_id, Some(comment.post_id)))
        }
    };

    let liked = state.store.toggle_like(viewer.id, subject, subject_id).await?;

    if liked {
        if let Some((author_id, post_id)) = notify {
            state
                .store
                .create_notification(author_id, viewer.id, NotificationKind::Like, post_id)
                .await?;
        }
    }

    Ok(Json(json!({
        "liked": liked,
        "like_count": state.store.like_count(subject, subject_id).await?
    })))
}

pub async fn toggle_save_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.store.get_post(post_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }

    let saved = state.store.toggle_save(viewer.id, post_id).await?;
    Ok(Json(json!({ "saved": saved })))
}

pub async fn saved_posts_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let posts = state.store.saved_posts(viewer.id).await?;
    let views = state.store.hydrate_posts(viewer.id, posts).await?;
    Ok(Json(json!({ "posts": views })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follows/{user_id}", post(toggle_follow_handler))
        .route("/follows/{user_id}/followers", get(followers_handler))
        .route("/follows/{user_id}/following", get(following_handler))
        .route("/likes/{subject_type}/{id}", post(toggle_like_handler))
        .route("/saves/{post_id}", post(toggle_save_handler))
        .route("/saves", get(saved_posts_handler))
}

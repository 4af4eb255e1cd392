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
use crate::models::{Conversation, NotificationKind, PublicUser};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: i64,
    pub text: String,
}

pub async fn send_message_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    if req.recipient_id == viewer.id {
        return Err(AppError::BadRequest("Cannot message yourself".to_string()));
    }

    if state.store.get_user(req.recipient_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "User {} not found",
            req.recipient_id
        )));
    }

    let message = state
        .store
        .create_message(viewer.id, req.recipient_id, text)
        .await?;

    state
        .store
        .create_notification(req.recipient_id, viewer.id, NotificationKind::Message, None)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

/// Fetching a conversation marks the incoming half as read.
pub async fn conversation_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let partner = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    state.store.mark_conversation_read(viewer.id, user_id).await?;
    let messages = state.store.conversation(viewer.id, user_id).await?;

    Ok(Json(json!({
        "partner": PublicUser::from(&partner),
        "messages": messages
    })))
}

pub async fn conversations_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let entries = state.store.conversations(viewer.id).await?;

    let mut conversations = Vec::with_capacity(entries.len());
    for (partner_id, last_message, unread_count) in entries {
        let Some(partner) = state.store.get_user(partner_id).await? else {
            continue;
        };
        conversations.push(Conversation {
            partner: PublicUser::from(&partner),
            last_message,
            unread_count,
        });
    }

    Ok(Json(json!({ "conversations": conversations })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message_handler))
        .route("/with/{user_id}", get(conversation_handler))
        .route("/conversations", get(conversations_handler))
}

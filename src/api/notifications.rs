// Notification feed, push-subscription registration, and the public
// contact form.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{NotificationView, PublicUser};

pub async fn list_notifications_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let notifications = state.store.notifications_for(viewer.id, 100).await?;

    let mut views = Vec::with_capacity(notifications.len());
    for notification in notifications {
        let Some(sender) = state.store.get_user(notification.sender_id).await? else {
            continue;
        };
        views.push(NotificationView {
            sender: PublicUser::from(&sender),
            notification,
        });
    }

    Ok(Json(json!({ "notifications": views })))
}

pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let updated = state.store.mark_all_notifications_read(viewer.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if !state.store.mark_notification_read(viewer.id, id).await? {
        return Err(AppError::NotFound(format!("Notification {} not found", id)));
    }
    Ok(Json(json!({ "read": true })))
}

pub async fn unread_count_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
) -> AppResult<Json<Value>> {
    let count = state.store.unread_notification_count(viewer.id).await?;
    Ok(Json(json!({ "count": count })))
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Matches the browser PushSubscription.toJSON() shape.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

pub async fn subscribe_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if req.endpoint.is_empty() || req.keys.p256dh.is_empty() || req.keys.auth.is_empty() {
        return Err(AppError::Validation(
            "endpoint and keys are required".to_string(),
        ));
    }

    let subscription = state
        .store
        .upsert_push_subscription(viewer.id, &req.endpoint, &req.keys.p256dh, &req.keys.auth)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "subscription": subscription }))))
}

pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    viewer: AuthUser,
    Json(req): Json<UnsubscribeRequest>,
) -> AppResult<StatusCode> {
    if !state
        .store
        .delete_push_subscription(viewer.id, &req.endpoint)
        .await?
    {
        return Err(AppError::NotFound("Subscription not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

pub async fn contact_handler(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if form.name.trim().is_empty()
        || form.email.trim().is_empty()
        || form.message.trim().is_empty()
    {
        return Err(AppError::Validation(
            "name, email and message are required".to_string(),
        ));
    }

    let request = state
        .store
        .create_contact_request(form.name.trim(), form.email.trim(), form.message.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": request.id }))))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/read", put(mark_all_read_handler))
        .route("/notifications/{id}/read", put(mark_read_handler))
        .route("/notifications/unread-count", get(unread_count_handler))
        .route("/push/subscriptions", post(subscribe_handler))
        .route("/push/subscriptions", delete(unsubscribe_handler))
        .route("/contact", post(contact_handler))
}

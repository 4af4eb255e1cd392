// REST surface under /api - one module per resource, combined here.

pub mod auth;
pub mod comments;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod social;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Query-string paging shared by the list endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct Paging {
    pub limit: Option<i32>,
    pub offset: Option<i64>,
}

impl Paging {
    pub fn limit(&self) -> i32 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .merge(social::router())
        .nest("/messages", messages::router())
        .merge(notifications::router())
        .nest("/uploads", uploads::router())
        .with_state(state)
}

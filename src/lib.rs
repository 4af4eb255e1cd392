// GrowBuddy - social networking REST backend

pub mod api;
pub mod app_state;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod id_generator;
pub mod models;
pub mod store;

// Re-exports for convenience
pub use error::{AppError, AppResult};

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};

use growbuddy::{api, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "growbuddy=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(config.clone()).await?;

    let app = Router::new()
        .nest("/api", api::router(state))
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))
        .layer(DefaultBodyLimit::max(config.uploads.max_bytes + 64 * 1024))
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    tracing::info!("GrowBuddy server listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

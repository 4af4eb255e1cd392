use std::sync::Arc;

use crate::{auth::AuthService, config::Config, store::SocialStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SocialStore>,
    pub auth: AuthService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = SocialStore::new(&config.database.url, config.cache.capacity).await?;
        store.init().await?;

        let auth = AuthService::new(&config.auth);

        Ok(Self {
            store: Arc::new(store),
            auth,
            config,
        })
    }
}

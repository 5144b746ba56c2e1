use std::sync::Arc;

use tracing::warn;

use super::{
    config::Config,
    database::init_redis,
    error::AppError,
    store::{RedisStore, ShareStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    store: Option<Arc<dyn ShareStore>>,
}

impl AppState {
    pub async fn new() -> Self {
        let config = Config::load();

        let store: Option<Arc<dyn ShareStore>> = match &config.redis_url {
            Some(url) => Some(Arc::new(RedisStore::new(init_redis(url).await))),
            None => {
                warn!("REDIS_URL not set, share tracking disabled");
                None
            }
        };

        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// The injected store, or the 503 configuration error when none is set.
    pub fn store(&self) -> Result<&Arc<dyn ShareStore>, AppError> {
        self.store.as_ref().ok_or(AppError::NotConfigured)
    }

    #[cfg(test)]
    pub fn with_store(store: Option<Arc<dyn ShareStore>>) -> Self {
        Self {
            config: Arc::new(Config {
                port: 0,
                redis_url: store.as_ref().map(|_| "redis://test".to_string()),
            }),
            store,
        }
    }
}

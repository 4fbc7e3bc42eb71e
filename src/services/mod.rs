//! Service container
//!
//! Everything the request handlers need is wired once at startup: the
//! storage handle (possibly degraded), the chart ingestor, and the lyrics
//! resolver with its fixed provider chain. The container is cheap to clone
//! and doubles as the axum state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::chart::ChartIngestor;
use crate::core::data::Storage;
use crate::core::lyrics::LyricsResolver;
use crate::core::services::chart::ChartClient;
use crate::core::services::providers;

#[derive(Clone)]
pub struct Services {
    config: Arc<Config>,
    storage: Storage,
    ingestor: ChartIngestor,
    resolver: LyricsResolver,
}

impl Services {
    pub async fn build(config: Config) -> Self {
        let config = Arc::new(config);
        let storage = Storage::connect(&config).await;

        let chart_client = ChartClient::new(
            &config.chart_instance,
            Duration::from_secs(config.feed_timeout_seconds),
        );
        let ingestor = ChartIngestor::new(chart_client, storage.clone());
        let resolver = LyricsResolver::new(providers::provider_chain(&config), storage.clone());

        Self {
            config,
            storage,
            ingestor,
            resolver,
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn ingestor(&self) -> &ChartIngestor {
        &self.ingestor
    }

    pub fn resolver(&self) -> &LyricsResolver {
        &self.resolver
    }
}

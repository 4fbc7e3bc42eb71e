//! Cache-first lyrics resolution
//!
//! Resolution order: stored record first, then the fixed provider chain,
//! strictly sequentially, stopping at the first provider that returns
//! non-blank text. The first success is persisted along with the provider
//! name; a full miss is surfaced as `LyricsError::NotFound` and nothing is
//! cached. Provider order never changes, even when a later provider might
//! have matched better.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::data::Storage;
use crate::core::services::providers::{LyricsProvider, ProviderOutcome};
use crate::error::LyricsError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLyrics {
    pub lyrics: String,
    /// Provider that supplied the text. Absent only for cache entries
    /// stored before source tracking.
    pub source: Option<String>,
}

#[derive(Clone)]
pub struct LyricsResolver {
    providers: Vec<Arc<dyn LyricsProvider>>,
    storage: Storage,
}

impl LyricsResolver {
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>, storage: Storage) -> Self {
        Self { providers, storage }
    }

    pub async fn resolve(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<ResolvedLyrics, LyricsError> {
        let title = title.trim();
        let artist = artist.trim();

        if let Some(record) = self.storage.lookup(title, artist).await {
            if let Some(lyrics) = record.lyrics.filter(|l| !l.is_empty()) {
                debug!("Lyrics cache hit for: {} - {}", artist, title);
                return Ok(ResolvedLyrics {
                    lyrics,
                    source: record.lyrics_source,
                });
            }
        }

        for provider in &self.providers {
            match provider.fetch(artist, title).await {
                ProviderOutcome::Found(text) => {
                    info!("Lyrics for {} - {} found via {}", artist, title, provider.name());
                    self.storage
                        .save_lyrics(title, artist, &text, provider.name())
                        .await;
                    return Ok(ResolvedLyrics {
                        lyrics: text,
                        source: Some(provider.name().to_string()),
                    });
                }
                ProviderOutcome::Empty => {
                    debug!("{} has no lyrics for {} - {}", provider.name(), artist, title);
                }
                ProviderOutcome::Failed(reason) => {
                    warn!("{} failed for {} - {}: {}", provider.name(), artist, title, reason);
                }
            }
        }

        Err(LyricsError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::core::data::SqliteSongStore;

    struct MockProvider {
        name: &'static str,
        outcome: ProviderOutcome,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(name: &'static str, outcome: ProviderOutcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn chain(providers: &[Arc<MockProvider>]) -> Vec<Arc<dyn LyricsProvider>> {
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn LyricsProvider>)
            .collect()
    }

    #[async_trait]
    impl LyricsProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _artist: &str, _title: &str) -> ProviderOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn sqlite_storage() -> Storage {
        Storage::from_store(Arc::new(SqliteSongStore::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_cache_precedence_skips_providers() {
        let storage = sqlite_storage();
        storage
            .save_lyrics("Song", "Artist", "cached words", "lyrist")
            .await;

        let provider = MockProvider::new("providerA", ProviderOutcome::Found("fresh".into()));
        let resolver = LyricsResolver::new(chain(&[provider.clone()]), storage);

        let resolved = resolver.resolve("Song", "Artist").await.unwrap();
        assert_eq!(resolved.lyrics, "cached words");
        assert_eq!(resolved.source.as_deref(), Some("lyrist"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let storage = sqlite_storage();
        let a = MockProvider::new("providerA", ProviderOutcome::Failed("status 500".into()));
        let b = MockProvider::new("providerB", ProviderOutcome::Found("La la la".into()));
        let c = MockProvider::new("providerC", ProviderOutcome::Found("wrong song".into()));

        let resolver =
            LyricsResolver::new(chain(&[a.clone(), b.clone(), c.clone()]), storage.clone());

        let resolved = resolver.resolve("Song", "Artist").await.unwrap();
        assert_eq!(resolved.lyrics, "La la la");
        assert_eq!(resolved.source.as_deref(), Some("providerB"));
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 0);

        // First success is persisted with its provider name
        let record = storage.lookup("Song", "Artist").await.unwrap();
        assert_eq!(record.lyrics.as_deref(), Some("La la la"));
        assert_eq!(record.lyrics_source.as_deref(), Some("providerB"));
    }

    #[tokio::test]
    async fn test_empty_and_failed_behave_identically() {
        let storage = sqlite_storage();
        let a = MockProvider::new("providerA", ProviderOutcome::Empty);
        let b = MockProvider::new("providerB", ProviderOutcome::Failed("timeout".into()));
        let c = MockProvider::new("providerC", ProviderOutcome::Found("found".into()));

        let resolver = LyricsResolver::new(chain(&[a.clone(), b.clone(), c.clone()]), storage);

        let resolved = resolver.resolve("Song", "Artist").await.unwrap();
        assert_eq!(resolved.lyrics, "found");
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_miss_is_not_found_and_uncached() {
        let storage = sqlite_storage();
        let a = MockProvider::new("providerA", ProviderOutcome::Failed("unreachable".into()));
        let b = MockProvider::new("providerB", ProviderOutcome::Empty);
        let c = MockProvider::new("providerC", ProviderOutcome::Empty);

        let resolver =
            LyricsResolver::new(chain(&[a.clone(), b.clone(), c.clone()]), storage.clone());

        let result = resolver.resolve("Song", "Artist").await;
        assert!(matches!(result, Err(LyricsError::NotFound)));
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 1);

        // Negative results are never cached
        assert!(storage.lookup("Song", "Artist").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_cached_lyrics_do_not_count_as_hit() {
        let storage = sqlite_storage();
        storage.save_lyrics("Song", "Artist", "", "lyrist").await;

        let provider = MockProvider::new("providerA", ProviderOutcome::Found("fresh".into()));
        let resolver = LyricsResolver::new(chain(&[provider.clone()]), storage);

        let resolved = resolver.resolve("Song", "Artist").await.unwrap();
        assert_eq!(resolved.lyrics, "fresh");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_storage_still_resolves() {
        let storage = Storage::unavailable("no database");
        let provider = MockProvider::new("providerA", ProviderOutcome::Found("words".into()));
        let resolver = LyricsResolver::new(chain(&[provider.clone()]), storage);

        let resolved = resolver.resolve("Song", "Artist").await.unwrap();
        assert_eq!(resolved.lyrics, "words");
        assert_eq!(resolved.source.as_deref(), Some("providerA"));
    }

    #[tokio::test]
    async fn test_inputs_are_trimmed_for_cache_key() {
        let storage = sqlite_storage();
        storage
            .save_lyrics("Song", "Artist", "cached", "lyrist")
            .await;

        let provider = MockProvider::new("providerA", ProviderOutcome::Found("fresh".into()));
        let resolver = LyricsResolver::new(chain(&[provider.clone()]), storage);

        let resolved = resolver.resolve("  Song ", " Artist  ").await.unwrap();
        assert_eq!(resolved.lyrics, "cached");
        assert_eq!(provider.call_count(), 0);
    }
}

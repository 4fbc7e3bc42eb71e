//! Chart ingestion
//!
//! Maps ranked feed entries to song records, upserts the chart-derived
//! fields, and reports whether usable lyrics are already cached for each
//! entry. The availability flag is a cache-presence check only; ingestion
//! never triggers a lyrics fetch.

use serde::Serialize;
use tracing::warn;

use crate::core::data::{ChartUpsert, Storage};
use crate::core::services::chart::{ChartClient, FeedEntry};
use crate::error::ChartError;

/// Cached lyrics shorter than this are treated as absent when reporting
/// availability (placeholder or truncated fragments are not worth linking).
const LYRICS_AVAILABLE_MIN_CHARS: usize = 30;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SongSummary {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover: Option<String>,
    pub apple_url: Option<String>,
    pub preview_url: Option<String>,
    pub lyrics_available: bool,
    pub rank: i64,
}

#[derive(Clone)]
pub struct ChartIngestor {
    client: ChartClient,
    storage: Storage,
}

impl ChartIngestor {
    pub fn new(client: ChartClient, storage: Storage) -> Self {
        Self { client, storage }
    }

    /// Fetch the ranked feed and upsert every entry. Feed failure is fatal;
    /// storage failure is not (summaries are still produced, uncached).
    pub async fn ingest(
        &self,
        country: &str,
        limit: u32,
    ) -> Result<Vec<SongSummary>, ChartError> {
        let entries = self.client.top_songs(country, limit).await?;
        Ok(self.ingest_entries(country, &entries).await)
    }

    async fn ingest_entries(&self, country: &str, entries: &[FeedEntry]) -> Vec<SongSummary> {
        let mut summaries = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            // Rank is the 1-based feed position
            let rank = (index + 1) as i64;

            let (Some(title), Some(artist)) = (entry.title(), entry.artist_name()) else {
                warn!("Skipping unkeyable feed entry at rank {rank}");
                continue;
            };

            let upsert = ChartUpsert {
                title: title.to_string(),
                artist: artist.to_string(),
                album: entry.album().map(str::to_string),
                cover: entry.cover().map(str::to_string),
                apple_url: entry.web_url().map(str::to_string),
                preview_url: entry.preview_url().map(str::to_string),
                country: country.to_string(),
                rank,
                tags: vec!["trending".to_string()],
            };
            self.storage.save_chart_entry(&upsert).await;

            let lyrics_available = self.lyrics_available(title, artist).await;

            summaries.push(SongSummary {
                title: title.to_string(),
                artist: artist.to_string(),
                album: upsert.album,
                cover: upsert.cover,
                apple_url: upsert.apple_url,
                preview_url: upsert.preview_url,
                lyrics_available,
                rank,
            });
        }

        summaries
    }

    async fn lyrics_available(&self, title: &str, artist: &str) -> bool {
        self.storage
            .lookup(title, artist)
            .await
            .and_then(|record| record.lyrics)
            .map(|lyrics| lyrics.chars().count() > LYRICS_AVAILABLE_MIN_CHARS)
            .unwrap_or(false)
    }
}

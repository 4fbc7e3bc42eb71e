//! SQLite persistence for song records
//!
//! A song record is identified by its (title, artist) pair, trimmed of
//! leading and trailing whitespace. Chart ingestion and lyrics resolution
//! write disjoint column sets, so an upsert from one side never clears the
//! other's data. The `Storage` handle wraps the store with an explicit
//! unavailable state: when the database cannot be opened the service keeps
//! running without a cache instead of failing requests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::StorageError;

const CURRENT_DB_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover: Option<String>,
    pub apple_url: Option<String>,
    pub preview_url: Option<String>,
    pub lyrics: Option<String>,
    pub lyrics_source: Option<String>,
    pub country: Option<String>,
    pub lang: Option<String>,
    pub rank: Option<i64>,
    pub tags: Option<Vec<String>>,
}

/// Chart-derived fields written during ingestion. Lyrics columns are
/// deliberately absent so a re-ingest cannot clear cached lyrics.
#[derive(Debug, Clone)]
pub struct ChartUpsert {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover: Option<String>,
    pub apple_url: Option<String>,
    pub preview_url: Option<String>,
    pub country: String,
    pub rank: i64,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait SongStore: Send + Sync {
    async fn get(&self, title: &str, artist: &str)
        -> Result<Option<SongRecord>, StorageError>;
    async fn upsert_chart(&self, entry: &ChartUpsert) -> Result<(), StorageError>;
    async fn upsert_lyrics(
        &self,
        title: &str,
        artist: &str,
        lyrics: &str,
        source: &str,
    ) -> Result<(), StorageError>;
    async fn song_count(&self) -> Result<i64, StorageError>;
}

pub struct SqliteSongStore {
    conn: Mutex<Connection>,
}

impl SqliteSongStore {
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        info!("Opening song database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Migration(format!("create data dir: {e}")))?;
        }

        let mut conn = Connection::open(db_path).map_err(StorageError::Open)?;

        // WAL mode for better concurrent access
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::migrate(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory().map_err(StorageError::Open)?;
        Self::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &mut Connection) -> Result<(), StorageError> {
        let existing_version: u32 = conn
            .prepare("PRAGMA user_version")?
            .query_row([], |row| row.get(0))?;

        if existing_version >= CURRENT_DB_VERSION {
            return Ok(());
        }

        debug!(
            "Upgrading song database from version {} to {}",
            existing_version, CURRENT_DB_VERSION
        );

        if existing_version == 0 {
            let tx = conn
                .transaction()
                .map_err(|e| StorageError::Migration(e.to_string()))?;

            tx.pragma_update(None, "user_version", CURRENT_DB_VERSION)?;

            tx.execute_batch(
                r#"
                CREATE TABLE songs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    artist TEXT NOT NULL,
                    album TEXT,
                    cover TEXT,
                    apple_url TEXT,
                    preview_url TEXT,
                    lyrics TEXT,
                    lyrics_source TEXT,
                    country TEXT DEFAULT 'id',
                    lang TEXT DEFAULT 'id',
                    chart_rank INTEGER,
                    tags TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(title, artist)
                );

                CREATE INDEX idx_songs_artist ON songs(artist);
                CREATE INDEX idx_songs_rank ON songs(chart_rank);
            "#,
            )?;

            tx.commit()
                .map_err(|e| StorageError::Migration(e.to_string()))?;
        }

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SongRecord> {
        let tags_json: Option<String> = row.get(11)?;
        let tags = tags_json.and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok());
        Ok(SongRecord {
            title: row.get(0)?,
            artist: row.get(1)?,
            album: row.get(2)?,
            cover: row.get(3)?,
            apple_url: row.get(4)?,
            preview_url: row.get(5)?,
            lyrics: row.get(6)?,
            lyrics_source: row.get(7)?,
            country: row.get(8)?,
            lang: row.get(9)?,
            rank: row.get(10)?,
            tags,
        })
    }
}

#[async_trait]
impl SongStore for SqliteSongStore {
    async fn get(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<SongRecord>, StorageError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT title, artist, album, cover, apple_url, preview_url,
                   lyrics, lyrics_source, country, lang, chart_rank, tags
            FROM songs WHERE title = ?1 AND artist = ?2
        "#,
        )?;

        let record = stmt
            .query_row(params![title, artist], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    async fn upsert_chart(&self, entry: &ChartUpsert) -> Result<(), StorageError> {
        let now = chrono::Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&entry.tags)
            .map_err(|e| StorageError::Migration(format!("serialize tags: {e}")))?;

        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO songs
                (title, artist, album, cover, apple_url, preview_url,
                 country, chart_rank, tags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(title, artist) DO UPDATE SET
                album = excluded.album,
                cover = excluded.cover,
                apple_url = excluded.apple_url,
                preview_url = excluded.preview_url,
                country = excluded.country,
                chart_rank = excluded.chart_rank,
                tags = excluded.tags,
                updated_at = excluded.updated_at
            "#,
            params![
                entry.title,
                entry.artist,
                entry.album,
                entry.cover,
                entry.apple_url,
                entry.preview_url,
                entry.country,
                entry.rank,
                tags_json,
                now,
            ],
        )?;
        Ok(())
    }

    async fn upsert_lyrics(
        &self,
        title: &str,
        artist: &str,
        lyrics: &str,
        source: &str,
    ) -> Result<(), StorageError> {
        let now = chrono::Utc::now().to_rfc3339();

        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO songs (title, artist, lyrics, lyrics_source, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(title, artist) DO UPDATE SET
                lyrics = excluded.lyrics,
                lyrics_source = excluded.lyrics_source,
                updated_at = excluded.updated_at
            "#,
            params![title, artist, lyrics, source, now],
        )?;
        Ok(())
    }

    async fn song_count(&self) -> Result<i64, StorageError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Process-wide storage handle with an explicit unavailable state.
///
/// All operations are best-effort: on an unavailable or failing store,
/// lookups return `None` and writes are dropped with a warning. Requests
/// never fail because the cache is gone.
#[derive(Clone)]
pub struct Storage {
    inner: Option<Arc<dyn SongStore>>,
    detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub available: bool,
    pub connection: String,
    pub song_count: Option<i64>,
}

impl Storage {
    /// Open the configured database; degrade to no-cache mode on failure.
    pub async fn connect(config: &Config) -> Self {
        match SqliteSongStore::new(&config.database_path).await {
            Ok(store) => Self {
                inner: Some(Arc::new(store)),
                detail: config.database_path.display().to_string(),
            },
            Err(e) => {
                warn!("Storage unavailable, running without cache: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_store(store: Arc<dyn SongStore>) -> Self {
        Self {
            inner: Some(store),
            detail: "injected store".to_string(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            inner: None,
            detail: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up a song by its trimmed (title, artist) key.
    pub async fn lookup(&self, title: &str, artist: &str) -> Option<SongRecord> {
        let store = self.inner.as_ref()?;
        match store.get(title.trim(), artist.trim()).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Song lookup failed for {} - {}: {e}", artist, title);
                None
            }
        }
    }

    pub async fn save_chart_entry(&self, entry: &ChartUpsert) {
        let Some(store) = self.inner.as_ref() else {
            return;
        };
        let keyed = ChartUpsert {
            title: entry.title.trim().to_string(),
            artist: entry.artist.trim().to_string(),
            ..entry.clone()
        };
        if let Err(e) = store.upsert_chart(&keyed).await {
            warn!(
                "Failed to persist chart entry {} - {}: {e}",
                keyed.artist, keyed.title
            );
        }
    }

    pub async fn save_lyrics(&self, title: &str, artist: &str, lyrics: &str, source: &str) {
        let Some(store) = self.inner.as_ref() else {
            return;
        };
        if let Err(e) = store
            .upsert_lyrics(title.trim(), artist.trim(), lyrics, source)
            .await
        {
            warn!("Failed to cache lyrics for {} - {}: {e}", artist, title);
        }
    }

    pub async fn status(&self) -> StorageStatus {
        match self.inner.as_ref() {
            Some(store) => match store.song_count().await {
                Ok(count) => StorageStatus {
                    available: true,
                    connection: format!("connected ({})", self.detail),
                    song_count: Some(count),
                },
                Err(e) => StorageStatus {
                    available: false,
                    connection: format!("connected but failing: {e}"),
                    song_count: None,
                },
            },
            None => StorageStatus {
                available: false,
                connection: format!("not connected: {}", self.detail),
                song_count: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_entry(title: &str, artist: &str, rank: i64) -> ChartUpsert {
        ChartUpsert {
            title: title.to_string(),
            artist: artist.to_string(),
            album: Some("Album".to_string()),
            cover: Some("https://example.com/cover-170.jpg".to_string()),
            apple_url: Some("https://example.com/song".to_string()),
            preview_url: None,
            country: "id".to_string(),
            rank,
            tags: vec!["trending".to_string()],
        }
    }

    fn test_storage() -> Storage {
        Storage::from_store(Arc::new(SqliteSongStore::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_chart_upsert_roundtrip() {
        let storage = test_storage();
        storage.save_chart_entry(&chart_entry("Song", "Artist", 3)).await;

        let record = storage.lookup("Song", "Artist").await.unwrap();
        assert_eq!(record.title, "Song");
        assert_eq!(record.artist, "Artist");
        assert_eq!(record.album.as_deref(), Some("Album"));
        assert_eq!(record.rank, Some(3));
        assert_eq!(record.country.as_deref(), Some("id"));
        assert_eq!(record.tags, Some(vec!["trending".to_string()]));
        assert!(record.lyrics.is_none());
    }

    #[tokio::test]
    async fn test_chart_upsert_preserves_lyrics() {
        let storage = test_storage();
        storage.save_chart_entry(&chart_entry("Song", "Artist", 1)).await;
        storage
            .save_lyrics("Song", "Artist", "La la la", "lyrics.ovh")
            .await;

        // Re-ingest at a new rank must keep the cached lyrics intact
        storage.save_chart_entry(&chart_entry("Song", "Artist", 7)).await;

        let record = storage.lookup("Song", "Artist").await.unwrap();
        assert_eq!(record.rank, Some(7));
        assert_eq!(record.lyrics.as_deref(), Some("La la la"));
        assert_eq!(record.lyrics_source.as_deref(), Some("lyrics.ovh"));
    }

    #[tokio::test]
    async fn test_lyrics_upsert_preserves_chart_fields() {
        let storage = test_storage();
        storage.save_chart_entry(&chart_entry("Song", "Artist", 2)).await;
        storage
            .save_lyrics("Song", "Artist", "Words", "lyrist")
            .await;

        let record = storage.lookup("Song", "Artist").await.unwrap();
        assert_eq!(record.rank, Some(2));
        assert_eq!(record.album.as_deref(), Some("Album"));
        assert_eq!(record.lyrics.as_deref(), Some("Words"));
    }

    #[tokio::test]
    async fn test_repeated_ingest_is_idempotent() {
        let storage = test_storage();
        let entry = chart_entry("Song", "Artist", 5);
        storage.save_chart_entry(&entry).await;
        let first = storage.lookup("Song", "Artist").await.unwrap();

        storage.save_chart_entry(&entry).await;
        let second = storage.lookup("Song", "Artist").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_key_is_trimmed() {
        let storage = test_storage();
        storage
            .save_lyrics("  Song  ", " Artist ", "text", "lyrist")
            .await;

        let record = storage.lookup("Song", "Artist").await.unwrap();
        assert_eq!(record.lyrics.as_deref(), Some("text"));

        // Lookups with surrounding whitespace hit the same record
        assert!(storage.lookup(" Song ", "Artist ").await.is_some());
    }

    #[tokio::test]
    async fn test_unavailable_storage_degrades() {
        let storage = Storage::unavailable("no database configured");
        assert!(!storage.is_available());

        storage.save_chart_entry(&chart_entry("Song", "Artist", 1)).await;
        storage.save_lyrics("Song", "Artist", "text", "lyrist").await;
        assert!(storage.lookup("Song", "Artist").await.is_none());

        let status = storage.status().await;
        assert!(!status.available);
        assert!(status.song_count.is_none());
    }

    #[tokio::test]
    async fn test_status_reports_song_count() {
        let storage = test_storage();
        storage.save_chart_entry(&chart_entry("A", "B", 1)).await;
        storage.save_chart_entry(&chart_entry("C", "D", 2)).await;

        let status = storage.status().await;
        assert!(status.available);
        assert_eq!(status.song_count, Some(2));
    }
}

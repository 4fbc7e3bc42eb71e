pub mod database;

pub use database::{ChartUpsert, SongRecord, SongStore, SqliteSongStore, Storage, StorageStatus};

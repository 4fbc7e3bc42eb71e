//! Error handling for the trendlyrics service
//!
//! This module provides a hierarchical error system with a single mapping
//! onto HTTP responses. Upstream feed failures are fatal to a request,
//! lyrics exhaustion surfaces as not-found, and storage problems never
//! escape the degraded-mode wrapper in normal operation.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("Lyrics error: {0}")]
    Lyrics(#[from] LyricsError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart feed unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("No lyrics found after exhausting providers")]
    NotFound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to open database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable error: {0}")]
    Environment(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Query(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::InvalidFormat(err))
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Chart(ChartError::Unavailable { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Lyrics(LyricsError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {self}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let chart = AppError::Chart(ChartError::Unavailable {
            reason: "timeout".to_string(),
        });
        assert_eq!(chart.status_code(), StatusCode::BAD_GATEWAY);

        let lyrics = AppError::Lyrics(LyricsError::NotFound);
        assert_eq!(lyrics.status_code(), StatusCode::NOT_FOUND);

        let validation = AppError::Validation("artist is required".to_string());
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let internal = AppError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

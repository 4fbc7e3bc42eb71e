//! Request handlers
//!
//! Thin glue between the HTTP surface and the core components. Parameter
//! validation happens here; everything else is delegated and errors map to
//! statuses through `AppError`.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::core::chart::SongSummary;
use crate::error::AppError;
use crate::services::Services;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Trending lyrics API ready" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

pub async fn trending(
    State(services): State<Services>,
    Query(params): Query<TrendingParams>,
) -> Result<Json<Vec<SongSummary>>, AppError> {
    let (country, limit) = validate_trending_params(&services.config(), &params)?;
    let summaries = services.ingestor().ingest(&country, limit).await?;
    Ok(Json(summaries))
}

fn validate_trending_params(
    config: &Config,
    params: &TrendingParams,
) -> Result<(String, u32), AppError> {
    let country = params
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&config.default_country)
        .to_string();

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 || limit > MAX_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )));
    }

    Ok((country, limit))
}

#[derive(Debug, Default, Deserialize)]
pub struct LyricsParams {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Serialize)]
pub struct LyricsBody {
    pub title: String,
    pub artist: String,
    pub lyrics: String,
    pub source: Option<String>,
}

pub async fn lyrics(
    State(services): State<Services>,
    Query(params): Query<LyricsParams>,
) -> Result<Json<LyricsBody>, AppError> {
    let (artist, title) = validate_lyrics_params(&params)?;
    let resolved = services.resolver().resolve(&title, &artist).await?;
    Ok(Json(LyricsBody {
        title,
        artist,
        lyrics: resolved.lyrics,
        source: resolved.source,
    }))
}

fn validate_lyrics_params(params: &LyricsParams) -> Result<(String, String), AppError> {
    let artist = params.artist.trim();
    let title = params.title.trim();

    if artist.is_empty() || title.is_empty() {
        return Err(AppError::Validation(
            "artist and title query parameters are required".to_string(),
        ));
    }

    Ok((artist.to_string(), title.to_string()))
}

/// Diagnostic status of storage connectivity. Not part of the functional
/// surface; the frontend health page reads it.
pub async fn diagnostics(State(services): State<Services>) -> Json<serde_json::Value> {
    let storage = services.storage().status().await;
    let config = services.config();
    Json(json!({
        "backend": "running",
        "storage": storage,
        "database_path": config.database_path.display().to_string(),
    }))
}

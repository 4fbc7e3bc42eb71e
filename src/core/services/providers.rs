//! Lyrics provider clients
//!
//! Three independent services with divergent request shapes and response
//! schemas, normalized to a single `ProviderOutcome`. A provider call never
//! raises: network errors, bad statuses, undecodable bodies, and missing or
//! blank lyric fields all collapse into `Empty`/`Failed`, which the
//! resolver treats identically.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Result of a single provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Found(String),
    Empty,
    Failed(String),
}

impl ProviderOutcome {
    fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) if !t.trim().is_empty() => ProviderOutcome::Found(t),
            _ => ProviderOutcome::Empty,
        }
    }
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, artist: &str, title: &str) -> ProviderOutcome;
}

/// Build the fixed provider chain in resolution order.
pub fn provider_chain(config: &Config) -> Vec<Arc<dyn LyricsProvider>> {
    let version = env!("CARGO_PKG_VERSION");
    let user_agent = format!("trendlyrics v{version}");

    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .expect("Failed to create HTTP client");

    let timeout = Duration::from_secs(config.provider_timeout_seconds);

    vec![
        Arc::new(LyristProvider {
            client: client.clone(),
            base_url: config.lyrist_instance.clone(),
            timeout,
        }),
        Arc::new(LyricsOvhProvider {
            client: client.clone(),
            base_url: config.lyrics_ovh_instance.clone(),
            timeout,
        }),
        Arc::new(SomeRandomApiProvider {
            client,
            base_url: config.some_random_api_instance.clone(),
            timeout,
        }),
    ]
}

fn path_url(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| e.to_string())?;
    url.path_segments_mut()
        .map_err(|_| "base URL cannot be a base".to_string())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    timeout: Duration,
) -> Result<T, String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("status {}", response.status().as_u16()));
    }

    response.json::<T>().await.map_err(|e| e.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct LyristResponse {
    #[serde(default)]
    lyrics: Option<String>,
    // Older deployments spell the field in the singular
    #[serde(default)]
    lyric: Option<String>,
}

impl LyristResponse {
    fn into_text(self) -> Option<String> {
        self.lyrics.or(self.lyric)
    }
}

/// Community lyrics API keyed by /api/{artist}/{title}.
pub struct LyristProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[async_trait]
impl LyricsProvider for LyristProvider {
    fn name(&self) -> &str {
        "lyrist"
    }

    async fn fetch(&self, artist: &str, title: &str) -> ProviderOutcome {
        let url = match path_url(&self.base_url, &["api", artist, title]) {
            Ok(url) => url,
            Err(e) => return ProviderOutcome::Failed(e),
        };

        match get_json::<LyristResponse>(&self.client, url, self.timeout).await {
            Ok(body) => ProviderOutcome::from_text(body.into_text()),
            Err(e) => ProviderOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LyricsOvhResponse {
    #[serde(default)]
    lyrics: Option<String>,
}

/// lyrics.ovh, keyed by /v1/{artist}/{title}.
pub struct LyricsOvhProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[async_trait]
impl LyricsProvider for LyricsOvhProvider {
    fn name(&self) -> &str {
        "lyrics.ovh"
    }

    async fn fetch(&self, artist: &str, title: &str) -> ProviderOutcome {
        let url = match path_url(&self.base_url, &["v1", artist, title]) {
            Ok(url) => url,
            Err(e) => return ProviderOutcome::Failed(e),
        };

        match get_json::<LyricsOvhResponse>(&self.client, url, self.timeout).await {
            Ok(body) => ProviderOutcome::from_text(body.lyrics),
            Err(e) => ProviderOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SomeRandomApiResponse {
    #[serde(default)]
    lyrics: Option<String>,
}

/// some-random-api, keyed by a single combined "artist title" query string.
/// May match a different artist than requested; accepted, not detected.
pub struct SomeRandomApiProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[async_trait]
impl LyricsProvider for SomeRandomApiProvider {
    fn name(&self) -> &str {
        "some-random-api"
    }

    async fn fetch(&self, artist: &str, title: &str) -> ProviderOutcome {
        let mut url = match path_url(&self.base_url, &["lyrics"]) {
            Ok(url) => url,
            Err(e) => return ProviderOutcome::Failed(e),
        };
        url.query_pairs_mut()
            .append_pair("title", &format!("{artist} {title}"));
        debug!("Combined-query lyrics lookup: {url}");

        match get_json::<SomeRandomApiResponse>(&self.client, url, self.timeout).await {
            Ok(body) => ProviderOutcome::from_text(body.lyrics),
            Err(e) => ProviderOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_url_percent_encodes_segments() {
        let url = path_url("https://api.lyrics.ovh", &["v1", "AC/DC", "Back in Black"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.lyrics.ovh/v1/AC%2FDC/Back%20in%20Black"
        );
    }

    #[test]
    fn test_path_url_respects_base_path() {
        let url = path_url("https://lyrist.vercel.app/", &["api", "a", "t"]).unwrap();
        assert_eq!(url.as_str(), "https://lyrist.vercel.app/api/a/t");
    }

    #[test]
    fn test_lyrist_field_fallback() {
        let modern: LyristResponse =
            serde_json::from_str(r#"{"lyrics": "from lyrics"}"#).unwrap();
        assert_eq!(modern.into_text().as_deref(), Some("from lyrics"));

        let legacy: LyristResponse = serde_json::from_str(r#"{"lyric": "from lyric"}"#).unwrap();
        assert_eq!(legacy.into_text().as_deref(), Some("from lyric"));

        let both: LyristResponse =
            serde_json::from_str(r#"{"lyrics": "plural", "lyric": "singular"}"#).unwrap();
        assert_eq!(both.into_text().as_deref(), Some("plural"));

        let neither: LyristResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(neither.into_text(), None);
    }

    #[test]
    fn test_blank_lyrics_are_empty() {
        assert_eq!(
            ProviderOutcome::from_text(Some("   \n ".to_string())),
            ProviderOutcome::Empty
        );
        assert_eq!(
            ProviderOutcome::from_text(Some(String::new())),
            ProviderOutcome::Empty
        );
        assert_eq!(ProviderOutcome::from_text(None), ProviderOutcome::Empty);
        assert_eq!(
            ProviderOutcome::from_text(Some("La la la".to_string())),
            ProviderOutcome::Found("La la la".to_string())
        );
    }
}

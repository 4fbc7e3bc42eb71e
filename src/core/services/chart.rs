//! Chart feed client
//!
//! Fetches the ranked top-songs feed and decodes its nested entry objects.
//! The feed wraps every scalar in a `{"label": ...}` object, ships images as
//! a size-ordered list, and serves `link` as either a single object or an
//! array depending on the entry. Every field is optional here; mapping
//! decides what is usable.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ChartError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Collection {
    #[serde(rename = "im:name", default)]
    pub name: Option<Label>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkAttributes {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedLink {
    #[serde(default)]
    pub attributes: Option<LinkAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Links {
    Many(Vec<FeedLink>),
    One(FeedLink),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "im:name", default)]
    pub name: Option<Label>,
    #[serde(rename = "im:artist", default)]
    pub artist: Option<Label>,
    #[serde(rename = "im:collection", default)]
    pub collection: Option<Collection>,
    #[serde(rename = "im:image", default)]
    pub images: Vec<Label>,
    #[serde(default)]
    pub link: Option<Links>,
}

impl FeedEntry {
    pub fn title(&self) -> Option<&str> {
        self.name.as_ref()?.label.as_deref()
    }

    pub fn artist_name(&self) -> Option<&str> {
        self.artist.as_ref()?.label.as_deref()
    }

    pub fn album(&self) -> Option<&str> {
        self.collection.as_ref()?.name.as_ref()?.label.as_deref()
    }

    /// Artwork URL: the feed orders images by size, largest last.
    pub fn cover(&self) -> Option<&str> {
        self.images.last()?.label.as_deref()
    }

    fn links(&self) -> Vec<&FeedLink> {
        match &self.link {
            Some(Links::Many(links)) => links.iter().collect(),
            Some(Links::One(link)) => vec![link],
            None => Vec::new(),
        }
    }

    /// First link exposing an href attribute, whatever its media type.
    pub fn web_url(&self) -> Option<&str> {
        self.links()
            .into_iter()
            .filter_map(|l| l.attributes.as_ref())
            .find_map(|a| a.href.as_deref())
    }

    /// First link whose declared media type starts with "audio/".
    pub fn preview_url(&self) -> Option<&str> {
        self.links()
            .into_iter()
            .filter_map(|l| l.attributes.as_ref())
            .find(|a| {
                a.media_type
                    .as_deref()
                    .map(|t| t.starts_with("audio/"))
                    .unwrap_or(false)
                    && a.href.is_some()
            })
            .and_then(|a| a.href.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entries {
    Many(Vec<FeedEntry>),
    One(Box<FeedEntry>),
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Option<Entries>,
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    feed: Option<Feed>,
}

#[derive(Clone)]
pub struct ChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChartClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("trendlyrics v{version}");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the ranked feed for a country. Any failure along the way is
    /// fatal for the caller's request; there is no partial result.
    pub async fn top_songs(
        &self,
        country: &str,
        limit: u32,
    ) -> Result<Vec<FeedEntry>, ChartError> {
        let url = format!(
            "{}/{}/rss/topsongs/limit={}/json",
            self.base_url, country, limit
        );
        debug!("Fetching chart feed: {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChartError::Unavailable {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChartError::Unavailable {
                reason: format!("feed returned status {}", response.status()),
            });
        }

        let document: FeedDocument =
            response.json().await.map_err(|e| ChartError::Unavailable {
                reason: format!("malformed feed body: {e}"),
            })?;

        let entries = match document.feed.and_then(|f| f.entry) {
            Some(Entries::Many(entries)) => entries,
            Some(Entries::One(entry)) => vec![*entry],
            None => Vec::new(),
        };

        debug!("Chart feed returned {} entries", entries.len());
        Ok(entries)
    }
}

//! Content fetchers
//!
//! Searches Google Books and YouTube for a topic and turns each hit into a
//! record candidate. Fetching never fails the command: any network, HTTP
//! or decoding problem is logged and yields no candidates.

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use kvault_core::config::MAX_FETCH_LIMIT;
use kvault_core::{Category, Config, NewRecord};

const BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Source tag for Google Books candidates
pub const SOURCE_GOOGLE_BOOKS: &str = "google_books";

/// Source tag for YouTube candidates
pub const SOURCE_YOUTUBE: &str = "youtube";

/// Characters of a description copied into the notes
const DESCRIPTION_LIMIT: usize = 300;

const UNTITLED: &str = "Untitled";

/// HTTP client for the content sources
pub struct Fetcher {
    client: reqwest::Client,
    limit: u32,
    youtube_api_key: Option<String>,
}

impl Fetcher {
    /// Build a fetcher with the configured limit, timeout and API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("kvault/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            limit: config.effective_fetch_limit(),
            youtube_api_key: config
                .youtube_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    /// Override the per-source item count, clamped to 1..=20
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_FETCH_LIMIT);
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn has_youtube_key(&self) -> bool {
        self.youtube_api_key.is_some()
    }

    /// Search Google Books
    pub async fn books(&self, query: &str) -> Vec<NewRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.books_inner(query).await {
            Ok(candidates) => {
                debug!(query, count = candidates.len(), "Fetched from Google Books");
                candidates
            }
            Err(e) => {
                warn!(query, error = %e, "Google Books fetch failed");
                Vec::new()
            }
        }
    }

    async fn books_inner(&self, query: &str) -> Result<Vec<NewRecord>> {
        let params = [("q", query.to_string()), ("maxResults", self.limit.to_string())];
        let body = self.get_text(BOOKS_URL, &params).await?;
        parse_books(&body, query)
    }

    /// Search YouTube; needs an API key
    pub async fn youtube(&self, query: &str) -> Vec<NewRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let Some(key) = self.youtube_api_key.as_deref() else {
            warn!("No YouTube API key configured, skipping YouTube");
            return Vec::new();
        };

        match self.youtube_inner(query, key).await {
            Ok(candidates) => {
                debug!(query, count = candidates.len(), "Fetched from YouTube");
                candidates
            }
            Err(e) => {
                warn!(query, error = %e, "YouTube fetch failed");
                Vec::new()
            }
        }
    }

    async fn youtube_inner(&self, query: &str, key: &str) -> Result<Vec<NewRecord>> {
        let params = [
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("maxResults", self.limit.to_string()),
            ("type", "video".to_string()),
            ("key", key.to_string()),
            ("safeSearch", "moderate".to_string()),
        ];
        let body = self.get_text(YOUTUBE_SEARCH_URL, &params).await?;
        parse_youtube(&body, query)
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
struct Volume {
    #[serde(default, rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    info_link: Option<String>,
    description: Option<String>,
    authors: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
}

/// Turn a Google Books volumes response into candidates
fn parse_books(body: &str, query: &str) -> Result<Vec<NewRecord>> {
    let response: VolumesResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|item| {
            let info = item.volume_info;
            let authors = info.authors.unwrap_or_default().join(", ");
            let mut notes = String::from("Fetched via Google Books. ");
            if !authors.is_empty() {
                notes.push_str(&format!("Authors: {}. ", authors));
            }
            notes.push_str(&excerpt(info.description.as_deref()));

            NewRecord::new(title_or_untitled(info.title))
                .with_category(Category::Book)
                .with_link(info.info_link.unwrap_or_default())
                .with_notes(notes.trim())
                .with_tags(query)
                .with_source(SOURCE_GOOGLE_BOOKS)
        })
        .collect())
}

/// Turn a YouTube search response into candidates
fn parse_youtube(body: &str, query: &str) -> Result<Vec<NewRecord>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|item| {
            let link = item
                .id
                .video_id
                .filter(|id| !id.is_empty())
                .map(|id| format!("{}{}", YOUTUBE_WATCH_URL, id))
                .unwrap_or_default();
            let notes = format!(
                "Fetched via YouTube. {}",
                excerpt(item.snippet.description.as_deref())
            );

            NewRecord::new(title_or_untitled(item.snippet.title))
                .with_category(Category::YouTube)
                .with_link(link)
                .with_notes(notes.trim())
                .with_tags(query)
                .with_source(SOURCE_YOUTUBE)
        })
        .collect())
}

fn title_or_untitled(title: Option<String>) -> String {
    title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn excerpt(description: Option<&str>) -> String {
    description
        .unwrap_or_default()
        .chars()
        .take(DESCRIPTION_LIMIT)
        .collect()
}

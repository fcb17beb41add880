pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::UserId;
use songbird::input::{Input, YoutubeDl};
use std::time::Duration;

pub use youtube::YouTubeClient;

/// Turns what a user typed into `/play` into a playable track.
#[async_trait]
pub trait MusicSource: Send + Sync {
    /// Searches the source and returns the best match.
    async fn search(&self, query: &str, requested_by: UserId) -> Result<TrackSource>;

    /// Fetches metadata for a direct URL.
    async fn get_track(&self, url: &str, requested_by: UserId) -> Result<TrackSource>;

    /// Whether the URL is one this source can play.
    fn is_valid_url(&self, url: &str) -> bool;

    fn source_name(&self) -> &'static str;

    /// URLs go straight to `get_track`, anything else is a search.
    async fn resolve(&self, query: &str, requested_by: UserId) -> Result<TrackSource> {
        let query = query.trim();
        if is_http_url(query) {
            if !self.is_valid_url(query) {
                anyhow::bail!("{} can't play that link", self.source_name());
            }
            self.get_track(query, requested_by).await
        } else {
            self.search(query, requested_by).await
        }
    }
}

pub fn is_http_url(query: &str) -> bool {
    url::Url::parse(query)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// A track ready to be queued.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSource {
    title: String,
    url: String,
    artist: Option<String>,
    duration: Option<Duration>,
    thumbnail: Option<String>,
    requested_by: UserId,
}

impl TrackSource {
    pub fn new(title: String, url: String, requested_by: UserId) -> Self {
        Self {
            title,
            url,
            artist: None,
            duration: None,
            thumbnail: None,
            requested_by,
        }
    }

    // Getters
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }
    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    // Setters
    pub fn with_artist(mut self, artist: String) -> Self {
        self.artist = Some(artist);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: String) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    /// Lazily-started yt-dlp input. Fetch and decode errors surface later as
    /// track error events, not here.
    pub fn input(&self, client: reqwest::Client) -> Input {
        Input::from(YoutubeDl::new(client, self.url.clone()))
    }
}

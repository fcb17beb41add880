use anyhow::{Context, Result};
use async_process::Command;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serenity::model::id::UserId;
use std::{sync::OnceLock, time::Duration};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{MusicSource, TrackSource};

/// Resolves YouTube links and searches through the `yt-dlp` executable.
pub struct YouTubeClient {
    // Limitar procesos yt-dlp concurrentes
    permits: Semaphore,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    title: String,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(3),
        }
    }

    pub fn is_youtube_url(url: &str) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN
            .get_or_init(|| {
                Regex::new(r"^https?://(www\.|m\.|music\.)?(youtube\.com|youtu\.be)/")
                    .expect("static regex")
            })
            .is_match(url)
    }

    async fn dump_json(&self, target: &str) -> Result<YtDlpInfo> {
        let _permit = self.permits.acquire().await?;

        debug!("📊 Obteniendo info de: {}", target);

        let output = Command::new("yt-dlp")
            .args([
                "--no-playlist",
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                target,
            ])
            .output()
            .await
            .context("Error al ejecutar yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("No se encontraron resultados"))?;

        serde_json::from_str(line).context("Error al parsear respuesta de yt-dlp")
    }

    fn info_to_track(info: YtDlpInfo, requested_by: UserId) -> TrackSource {
        let url = info
            .webpage_url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", info.id));

        let mut track = TrackSource::new(info.title, url, requested_by);

        if let Some(uploader) = info.uploader {
            track = track.with_artist(uploader);
        }
        if let Some(seconds) = info.duration.filter(|d| d.is_finite() && *d > 0.0) {
            track = track.with_duration(Duration::from_secs_f64(seconds));
        }
        if let Some(thumbnail) = info.thumbnail {
            track = track.with_thumbnail(thumbnail);
        }

        track
    }
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MusicSource for YouTubeClient {
    async fn search(&self, query: &str, requested_by: UserId) -> Result<TrackSource> {
        info!("🔍 Buscando en YouTube: {}", query);
        let info = self.dump_json(&format!("ytsearch1:{}", query)).await?;
        Ok(Self::info_to_track(info, requested_by))
    }

    async fn get_track(&self, url: &str, requested_by: UserId) -> Result<TrackSource> {
        let info = self.dump_json(url).await?;
        Ok(Self::info_to_track(info, requested_by))
    }

    fn is_valid_url(&self, url: &str) -> bool {
        Self::is_youtube_url(url)
    }

    fn source_name(&self) -> &'static str {
        "YouTube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_detection() {
        assert!(YouTubeClient::is_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(YouTubeClient::is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(YouTubeClient::is_youtube_url(
            "https://music.youtube.com/watch?v=test"
        ));
        assert!(!YouTubeClient::is_youtube_url("https://example.com/video"));
    }

    #[test]
    fn test_info_to_track_builds_watch_url() {
        let info: YtDlpInfo = serde_json::from_str(
            r#"{"id":"abc123","title":"Song","duration":185.0,"uploader":"Band"}"#,
        )
        .unwrap();

        let track = YouTubeClient::info_to_track(info, UserId::new(7));

        assert_eq!(track.title(), "Song");
        assert_eq!(track.url(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(track.artist(), Some("Band"));
        assert_eq!(track.duration(), Some(Duration::from_secs(185)));
        assert_eq!(track.requested_by(), UserId::new(7));
    }

    #[test]
    fn test_live_streams_have_no_duration() {
        let info: YtDlpInfo =
            serde_json::from_str(r#"{"id":"live","title":"Radio","duration":null}"#).unwrap();
        assert_eq!(YouTubeClient::info_to_track(info, UserId::new(1)).duration(), None);
    }
}

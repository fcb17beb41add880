//! # Audio Module
//!
//! Music playback for the bot.
//!
//! ### [`queue`] - Queue Management
//! - One FIFO queue per guild with a now-playing slot
//! - Shuffling of pending entries
//!
//! ### [`player`] - Audio Player
//! - Starts tracks on the guild's songbird call
//! - Advances the queue when a track ends or fails
//!
//! Fetching and transcoding happen in `yt-dlp` and `ffmpeg`, so both must be on
//! `PATH`. [`VoiceSupport::detect`] checks for them once at startup; without them
//! the music commands stay registered but refuse to run.

pub mod player;
pub mod queue;

use async_process::Command;
use tracing::{info, warn};

/// External tools required for playback.
const REQUIRED_TOOLS: [(&str, &str); 2] = [("yt-dlp", "--version"), ("ffmpeg", "-version")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSupport {
    Available,
    Unavailable(String),
}

impl VoiceSupport {
    pub async fn detect() -> Self {
        let mut missing = Vec::new();

        for (tool, version_flag) in REQUIRED_TOOLS {
            match Command::new(tool).arg(version_flag).output().await {
                Ok(output) if output.status.success() => {
                    let version = String::from_utf8_lossy(&output.stdout);
                    info!(
                        "✅ {} disponible: {}",
                        tool,
                        version.lines().next().unwrap_or_default().trim()
                    );
                }
                Ok(output) => {
                    warn!("❌ {} terminó con estado {}", tool, output.status);
                    missing.push(tool);
                }
                Err(e) => {
                    warn!("❌ {} no está instalado o no está en PATH: {}", tool, e);
                    missing.push(tool);
                }
            }
        }

        Self::from_missing(&missing)
    }

    fn from_missing(missing: &[&str]) -> Self {
        if missing.is_empty() {
            Self::Available
        } else {
            Self::Unavailable(format!("missing {} on the host", missing.join(" and ")))
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tools_are_named() {
        assert_eq!(VoiceSupport::from_missing(&[]), VoiceSupport::Available);
        assert_eq!(
            VoiceSupport::from_missing(&["yt-dlp", "ffmpeg"]),
            VoiceSupport::Unavailable("missing yt-dlp and ffmpeg on the host".to_string())
        );
    }
}

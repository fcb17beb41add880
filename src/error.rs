use thiserror::Error;

/// Errors a slash command can end with.
///
/// Everything except [`CommandError::Discord`] and [`CommandError::Internal`]
/// is an expected outcome that is shown to the user as-is.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),

    #[error("rate limited")]
    RateLimited,

    #[error("command used outside of a server")]
    NotInGuild,

    #[error("user is not in a voice channel")]
    NotInVoice,

    #[error("voice playback unavailable: {0}")]
    VoiceUnavailable(String),

    #[error("queue is empty")]
    QueueEmpty,

    #[error("{0}")]
    External(String),

    #[error(transparent)]
    Discord(#[from] serenity::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Unexpected failures get logged at error level and a generic reply.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Discord(_) | Self::Internal(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => format!("❌ {}", message),
            Self::RateLimited => {
                "⏳ You're sending commands too quickly. Try again later.".to_string()
            }
            Self::NotInGuild => "❌ This command can only be used in a server.".to_string(),
            Self::NotInVoice => "❌ You need to be in a voice channel first.".to_string(),
            Self::VoiceUnavailable(reason) => {
                format!("🔇 Music playback is unavailable on this bot: {}", reason)
            }
            Self::QueueEmpty => "📭 The queue is empty.".to_string(),
            Self::External(message) => format!("⚠️ {}", message),
            Self::Discord(_) | Self::Internal(_) => {
                "❌ Something went wrong while running that command.".to_string()
            }
        }
    }
}

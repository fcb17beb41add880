//! # Bot Module
//!
//! Discord side of Chatter Bot.
//!
//! The bot is built around the [`ChatBot`] struct which implements
//! Serenity's [`EventHandler`] trait. It owns:
//!
//! - Audio playback through [`AudioPlayer`]
//! - Per-user command throttling through [`RateLimiter`]
//! - Open trivia rounds through [`TriviaBoard`]
//! - The HTTP clients used by the utility commands
//!
//! Slash commands are parsed and dispatched in [`handlers`]; their names and
//! options live in [`commands`].

use anyhow::Result;
use dashmap::DashSet;
use rand::thread_rng;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Interaction, Message, Ready, VoiceState},
    async_trait,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{
    audio::{player::AudioPlayer, VoiceSupport},
    config::Config,
    error::CommandError,
    limiter::RateLimiter,
    sources::{MusicSource, YouTubeClient},
    trivia::{TriviaBoard, TriviaClient},
    utility::{spelling::SpellingWatcher, weather::WeatherClient, wiki::WikiClient},
};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

/// Main Discord event handler.
///
/// Shared state uses [`Arc`] and [`DashMap`](dashmap::DashMap) so that
/// background tasks (track events, trivia timeouts, maintenance) can hold
/// their own handles.
pub struct ChatBot {
    config: Arc<Config>,
    player: AudioPlayer,
    source: Box<dyn MusicSource>,
    limiter: Arc<RateLimiter>,
    trivia: Arc<TriviaBoard>,
    trivia_client: TriviaClient,
    weather: WeatherClient,
    wiki: WikiClient,
    voice: VoiceSupport,
    spelling: Option<SpellingWatcher>,
    // Guilds whose songbird `Call` already carries the driver event handlers
    voice_events: DashSet<GuildId>,
    // `ready` fires again after every gateway reconnect
    maintenance_started: AtomicBool,
}

impl ChatBot {
    pub fn new(config: Config, voice: VoiceSupport, spelling: Option<SpellingWatcher>) -> Self {
        let config = Arc::new(config);

        Self {
            player: AudioPlayer::new(config.max_queue_size),
            source: Box::new(YouTubeClient::new()),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_per_user,
                Duration::from_secs(config.rate_limit_window_secs),
            )),
            trivia: Arc::new(TriviaBoard::new()),
            trivia_client: TriviaClient::new(config.trivia_api_url.clone()),
            weather: WeatherClient::new(config.weather_api_url.clone()),
            wiki: WikiClient::new(),
            voice,
            spelling,
            voice_events: DashSet::new(),
            maintenance_started: AtomicBool::new(false),
            config,
        }
    }

    /// Registers slash commands with Discord.
    ///
    /// Production registers globally (propagation can take up to an hour).
    /// Otherwise commands go to `GUILD_ID` when it is set, which updates
    /// almost immediately.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id.filter(|_| !self.config.production) {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registrando comandos para guild específica: {}", guild_id);

                commands::register_guild_commands(ctx, guild_id)
                    .await
                    .map_err(|e| {
                        error!("❌ Error registrando comandos de guild: {:?}", e);
                        anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                    })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }

    /// Returns the active call for `guild_id`, joining `channel_id` when the
    /// bot isn't connected anywhere in that guild yet.
    async fn ensure_voice(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<tokio::sync::Mutex<songbird::Call>>, CommandError> {
        if let Some(call) = self.voice_call(ctx, guild_id).await {
            if call.lock().await.current_channel().is_some() {
                return Ok(call);
            }
        }

        self.join_voice_channel(ctx, guild_id, channel_id).await
    }

    async fn join_voice_channel(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<tokio::sync::Mutex<songbird::Call>>, CommandError> {
        let manager = songbird::get(ctx).await.ok_or_else(|| {
            CommandError::VoiceUnavailable("Songbird no inicializado".to_string())
        })?;

        match manager.join(guild_id, channel_id).await {
            Ok(call) => {
                // songbird reuses the same `Call` when re-joining a guild
                if self.claim_voice_events(guild_id) {
                    events::register_voice_events(&mut *call.lock().await, guild_id);
                }
                info!("🔊 Conectado al canal de voz en guild {}", guild_id);
                Ok(call)
            }
            Err(e) => {
                error!("Error al conectar al canal de voz: {:?}", e);
                Err(CommandError::External(
                    "I couldn't join your voice channel. Check my Connect and Speak permissions."
                        .to_string(),
                ))
            }
        }
    }

    /// Disconnects from voice in `guild_id`. Returns `false` when the bot
    /// wasn't connected.
    async fn leave_voice_channel(&self, ctx: &Context, guild_id: GuildId) -> Result<bool, CommandError> {
        let Some(manager) = songbird::get(ctx).await else {
            return Ok(false);
        };

        if manager.get(guild_id).is_none() {
            return Ok(false);
        }

        manager
            .remove(guild_id)
            .await
            .map_err(|e| CommandError::Internal(e.into()))?;
        self.release_voice_events(guild_id);

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        Ok(true)
    }

    /// Returns `true` the first time it is called for a guild's current `Call`.
    fn claim_voice_events(&self, guild_id: GuildId) -> bool {
        self.voice_events.insert(guild_id)
    }

    fn release_voice_events(&self, guild_id: GuildId) {
        self.voice_events.remove(&guild_id);
    }

    async fn voice_call(
        &self,
        ctx: &Context,
        guild_id: GuildId,
    ) -> Option<Arc<tokio::sync::Mutex<songbird::Call>>> {
        songbird::get(ctx).await?.get(guild_id)
    }
}

#[async_trait]
impl EventHandler for ChatBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }

        if !self.maintenance_started.swap(true, Ordering::SeqCst) {
            let limiter = self.limiter.clone();
            let trivia = self.trivia.clone();
            tokio::spawn(async move {
                maintenance_tasks(limiter, trivia).await;
            });
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command_interaction) => {
                handlers::handle_command(&ctx, command_interaction, self).await;
            }
            Interaction::Component(component_interaction) => {
                handlers::handle_component(&ctx, component_interaction, self).await;
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(watcher) = &self.spelling else {
            return;
        };
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }

        let flagged = watcher.check(&msg.content);
        if flagged.is_empty() {
            return;
        }

        debug!("✏️ {} palabras marcadas en mensaje de {}", flagged.len(), msg.author.name);
        let reply = watcher.reply(&flagged, &mut thread_rng());
        if let Err(e) = msg.reply(&ctx.http, reply).await {
            warn!("No se pudo responder al mensaje: {:?}", e);
        }
    }

    /// Clears playback state when the bot itself is disconnected from voice,
    /// whether by `/leave` or by a moderator.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || new.channel_id.is_some() || old.is_none() {
            return;
        }

        if let Some(guild_id) = new.guild_id {
            info!("🔌 Bot desconectado en guild {}", guild_id);
            self.player.stop(guild_id);
        }
    }
}

/// Housekeeping that keeps per-user and per-round state bounded.
async fn maintenance_tasks(limiter: Arc<RateLimiter>, trivia: Arc<TriviaBoard>) {
    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);

    loop {
        interval.tick().await;

        limiter.prune();
        debug!(
            "🧹 Mantenimiento: {} usuarios con historial, {} rondas de trivia abiertas",
            limiter.tracked_users(),
            trivia.open_rounds()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_events_registered_once_per_call() {
        let bot = ChatBot::new(Config::default(), VoiceSupport::Available, None);
        let guild = GuildId::new(7);

        assert!(bot.claim_voice_events(guild));
        assert!(!bot.claim_voice_events(guild));
        assert!(bot.claim_voice_events(GuildId::new(8)));

        bot.release_voice_events(guild);
        assert!(bot.claim_voice_events(guild));
    }
}

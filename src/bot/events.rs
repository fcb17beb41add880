use serenity::{async_trait, model::id::GuildId};
use songbird::{
    events::CoreEvent, Call, Event as VoiceEvent, EventContext, EventHandler as VoiceEventHandler,
};
use tracing::{info, warn};

/// Handler para cambios de estado del driver de voz
pub struct DriverStateHandler {
    pub guild_id: GuildId,
}

#[async_trait]
impl VoiceEventHandler for DriverStateHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<VoiceEvent> {
        match ctx {
            EventContext::DriverConnect(_) => {
                info!("🔊 Driver de voz conectado en guild {}", self.guild_id);
            }
            EventContext::DriverReconnect(_) => {
                info!("🔄 Reconectado al canal de voz en guild {}", self.guild_id);
            }
            EventContext::DriverDisconnect(data) => {
                warn!(
                    "🔌 Driver de voz desconectado en guild {}: {:?}",
                    self.guild_id, data.reason
                );
            }
            _ => {}
        }

        None
    }
}

/// Registra los event handlers del driver para un guild
pub fn register_voice_events(call: &mut Call, guild_id: GuildId) {
    for event in [
        CoreEvent::DriverConnect,
        CoreEvent::DriverReconnect,
        CoreEvent::DriverDisconnect,
    ] {
        call.add_global_event(VoiceEvent::Core(event), DriverStateHandler { guild_id });
    }
}

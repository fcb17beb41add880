use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod error;
mod health;
mod limiter;
mod logging;
mod sources;
mod trivia;
mod ui;
mod utility;

use crate::audio::VoiceSupport;
use crate::bot::ChatBot;
use crate::config::Config;
use crate::health::Uptime;
use crate::utility::spelling::SpellingWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Config::load()?;

    // Inicializar logging
    logging::init(&config.log_dir, config.production)?;

    info!("🤖 Iniciando Chatter Bot v{}", env!("CARGO_PKG_VERSION"));
    info!("⚙️ {}", config.summary());

    let uptime = Arc::new(Uptime::start());

    // Verificar yt-dlp y ffmpeg
    let voice = VoiceSupport::detect().await;
    if let VoiceSupport::Unavailable(reason) = &voice {
        warn!("🔇 Comandos de música desactivados: {}", reason);
    }

    let spelling = if config.enable_spellcheck {
        match SpellingWatcher::load(&config.dictionary_path, &config.word_list_path) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("✏️ Corrector ortográfico desactivado: {:?}", e);
                None
            }
        }
    } else {
        None
    };

    // Endpoint de salud
    let port = config.port;
    let health_uptime = uptime.clone();
    tokio::spawn(async move {
        if let Err(e) = health::serve(port, health_uptime).await {
            error!("❌ Endpoint de salud detenido: {:?}", e);
        }
    });

    // Configurar intents mínimos necesarios
    let mut intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;
    if spelling.is_some() {
        intents |= GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    }

    let token = config.discord_token.clone();
    let handler = ChatBot::new(config, voice, spelling);

    // Construir cliente
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird()
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    // Iniciar bot
    info!("🚀 Conectando a Discord...");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
        return Err(why.into());
    }

    info!("👋 Bot detenido tras {}s en línea", uptime.seconds());
    Ok(())
}

async fn health_check() -> Result<()> {
    let voice = VoiceSupport::detect().await;
    if voice.is_available() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes: {:?}", voice);
    }
}

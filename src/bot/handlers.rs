use rand::thread_rng;
use serenity::{
    builder::{
        CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{
        application::{CommandDataOptionValue, CommandInteraction, ComponentInteraction},
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    audio::{player::EnqueueOutcome, queue::QueueItem, VoiceSupport},
    bot::ChatBot,
    error::CommandError,
    trivia::{self, AnswerOutcome, TriviaRound},
    ui::{
        buttons,
        embeds::{self, TriviaResult},
    },
    utility::{facts, random},
};

/// A slash command with its options parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Play { query: String },
    Queue { page: usize },
    Skip,
    Stop,
    Leave,
    Shuffle,
    Trivia,
    Fact,
    Coin,
    Number { min: i64, max: i64 },
    Weather { city: String },
    Wiki { query: String },
    Ping,
    Help,
}

impl BotCommand {
    pub fn parse(
        name: &str,
        options: &[(&str, &CommandDataOptionValue)],
    ) -> Result<Self, CommandError> {
        let command = match name {
            "play" => Self::Play {
                query: required_text(options, "query", "Tell me what to play.")?,
            },
            "queue" => Self::Queue {
                page: integer(options, "page").unwrap_or(1).max(1) as usize,
            },
            "skip" => Self::Skip,
            "stop" => Self::Stop,
            "leave" => Self::Leave,
            "shuffle" => Self::Shuffle,
            "trivia" => Self::Trivia,
            "fact" => Self::Fact,
            "coin" => Self::Coin,
            "number" => {
                let min = integer(options, "min")
                    .ok_or_else(|| CommandError::validation("Give me a minimum number."))?;
                let max = integer(options, "max")
                    .ok_or_else(|| CommandError::validation("Give me a maximum number."))?;
                random::validate_range(min, max)?;
                Self::Number { min, max }
            }
            "weather" => Self::Weather {
                city: required_text(options, "city", "Tell me which city.")?,
            },
            "wiki" => Self::Wiki {
                query: required_text(options, "query", "Tell me what to look up.")?,
            },
            "ping" => Self::Ping,
            "help" => Self::Help,
            other => return Err(CommandError::validation(format!("Unknown command `/{}`", other))),
        };

        Ok(command)
    }

    pub fn is_music(&self) -> bool {
        matches!(
            self,
            Self::Play { .. } | Self::Queue { .. } | Self::Skip | Self::Stop | Self::Leave | Self::Shuffle
        )
    }
}

fn text<'a>(options: &[(&str, &'a CommandDataOptionValue)], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|(option, _)| *option == name)
        .and_then(|(_, value)| value.as_str())
}

fn required_text(
    options: &[(&str, &CommandDataOptionValue)],
    name: &str,
    missing: &str,
) -> Result<String, CommandError> {
    text(options, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CommandError::validation(missing))
}

fn integer(options: &[(&str, &CommandDataOptionValue)], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|(option, _)| *option == name)
        .and_then(|(_, value)| value.as_i64())
}

/// Maneja comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction, bot: &ChatBot) {
    info!(
        "📝 Comando /{} usado por {} en {}",
        command.data.name,
        command.user.name,
        command
            .guild_id
            .map_or("DM".to_string(), |id| format!("guild {}", id))
    );

    if let Err(err) = dispatch(ctx, &command, bot).await {
        if err.is_internal() {
            error!("Error manejando /{}: {:?}", command.data.name, err);
        } else {
            warn!("/{} terminó con: {}", command.data.name, err);
        }

        if let Err(e) = reply_error(ctx, &command, &err).await {
            error!("No se pudo responder el error de /{}: {:?}", command.data.name, e);
        }
    }
}

async fn dispatch(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    let options: Vec<(&str, &CommandDataOptionValue)> = command
        .data
        .options
        .iter()
        .map(|option| (option.name.as_str(), &option.value))
        .collect();
    let parsed = BotCommand::parse(&command.data.name, &options)?;

    if !bot.limiter.allow(command.user.id) {
        return Err(CommandError::RateLimited);
    }

    if parsed.is_music() {
        if let VoiceSupport::Unavailable(reason) = &bot.voice {
            return Err(CommandError::VoiceUnavailable(reason.clone()));
        }
    }

    match parsed {
        BotCommand::Play { query } => handle_play(ctx, command, bot, &query).await,
        BotCommand::Queue { page } => handle_queue(ctx, command, bot, page).await,
        BotCommand::Skip => handle_skip(ctx, command, bot).await,
        BotCommand::Stop => handle_stop(ctx, command, bot).await,
        BotCommand::Leave => handle_leave(ctx, command, bot).await,
        BotCommand::Shuffle => handle_shuffle(ctx, command, bot).await,
        BotCommand::Trivia => handle_trivia(ctx, command, bot).await,
        BotCommand::Fact => {
            let fact = facts::random_fact(&mut thread_rng());
            respond(ctx, command, message().content(format!("💡 Did you know? {}", fact))).await
        }
        BotCommand::Coin => {
            let side = random::flip_coin(&mut thread_rng());
            respond(ctx, command, message().content(format!("🪙 {}!", side))).await
        }
        BotCommand::Number { min, max } => {
            let number = random::number_between(&mut thread_rng(), min, max)?;
            respond(
                ctx,
                command,
                message().content(format!("🎲 Here is your number: **{}**", number)),
            )
            .await
        }
        BotCommand::Weather { city } => handle_weather(ctx, command, bot, &city).await,
        BotCommand::Wiki { query } => handle_wiki(ctx, command, bot, &query).await,
        BotCommand::Ping => handle_ping(ctx, command).await,
        BotCommand::Help => {
            respond(ctx, command, message().embed(embeds::create_help_embed()).ephemeral(true)).await
        }
    }
}

/// Maneja interacciones con componentes (botones de trivia)
pub async fn handle_component(ctx: &Context, component: ComponentInteraction, bot: &ChatBot) {
    debug!(
        "🔘 Botón {} presionado por {}",
        component.data.custom_id, component.user.name
    );

    let response = match trivia::parse_custom_id(&component.data.custom_id) {
        Some((round_id, choice)) => {
            match bot
                .trivia
                .answer(round_id, component.user.id, choice, Instant::now())
            {
                AnswerOutcome::NotEligible => ephemeral("This isn't your question!"),
                AnswerOutcome::Expired => ephemeral("⏰ This round is already over."),
                AnswerOutcome::InvalidChoice => ephemeral("❌ That's not one of the options."),
                AnswerOutcome::Finished { round, correct } => {
                    let result = if correct {
                        TriviaResult::Correct(component.user.id)
                    } else {
                        TriviaResult::Wrong(component.user.id)
                    };
                    CreateInteractionResponse::UpdateMessage(
                        CreateInteractionResponseMessage::new()
                            .embed(embeds::create_trivia_result_embed(&round, result))
                            .components(buttons::create_trivia_buttons(
                                round_id,
                                round.options().len(),
                                true,
                            )),
                    )
                }
            }
        }
        None => ephemeral("❌ Unknown action"),
    };

    if let Err(e) = component.create_response(&ctx.http, response).await {
        error!("Error manejando componente: {:?}", e);
    }
}

// Handlers específicos para cada comando

async fn handle_play(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
    query: &str,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;
    let voice_channel_id = user_voice_channel(ctx, guild_id, command.user.id)?;

    // Defer la respuesta ya que yt-dlp puede tardar
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let track = bot
        .source
        .resolve(query, command.user.id)
        .await
        .map_err(|e| {
            warn!(
                "No se pudo resolver '{}' con {}: {:?}",
                query,
                bot.source.source_name(),
                e
            );
            CommandError::External(format!("Couldn't find anything playable for `{}`.", query))
        })?;

    let call = bot.ensure_voice(ctx, guild_id, voice_channel_id).await?;

    let preview = QueueItem::from(track.clone());
    let outcome = bot
        .player
        .enqueue(guild_id, track, command.channel_id, call, ctx.http.clone())
        .await
        .map_err(|e| CommandError::validation(e.to_string()))?;

    let embed = match outcome {
        EnqueueOutcome::Started(item) => embeds::create_now_playing_embed(&item),
        EnqueueOutcome::Queued(position) => embeds::create_track_added_embed(&preview, position),
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;

    Ok(())
}

async fn handle_queue(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
    page: usize,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;
    let queue_info = bot.player.queue_info(guild_id);

    respond(
        ctx,
        command,
        message().embed(embeds::create_queue_embed(&queue_info, page)),
    )
    .await
}

async fn handle_skip(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;
    let call = bot.voice_call(ctx, guild_id).await.ok_or(CommandError::QueueEmpty)?;

    match bot.player.skip(guild_id, call, ctx.http.clone()).await? {
        Some(next) => {
            respond(
                ctx,
                command,
                message()
                    .content("⏭️ Skipped")
                    .embed(embeds::create_now_playing_embed(&next)),
            )
            .await
        }
        None => Err(CommandError::QueueEmpty),
    }
}

async fn handle_stop(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;

    bot.player.stop(guild_id);
    bot.leave_voice_channel(ctx, guild_id).await?;

    respond(
        ctx,
        command,
        message().content("⏹️ Playback stopped and the queue was cleared"),
    )
    .await
}

async fn handle_leave(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;

    bot.player.stop(guild_id);
    if !bot.leave_voice_channel(ctx, guild_id).await? {
        return Err(CommandError::validation("I'm not in a voice channel."));
    }

    respond(ctx, command, message().content("👋 Left the voice channel")).await
}

async fn handle_shuffle(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    let guild_id = require_guild(command)?;

    let content = match bot.player.shuffle(guild_id) {
        0 | 1 => "🤷 Not enough songs waiting in the queue to shuffle.".to_string(),
        shuffled => format!("🔀 Shuffled {} upcoming songs", shuffled),
    };

    respond(ctx, command, message().content(content)).await
}

async fn handle_trivia(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
) -> Result<(), CommandError> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let question = bot.trivia_client.fetch_question().await.map_err(|e| {
        warn!("Error obteniendo trivia: {:?}", e);
        CommandError::External("Couldn't fetch a trivia question right now.".to_string())
    })?;

    let timeout = Duration::from_secs(bot.config.trivia_timeout_secs);
    let round = TriviaRound::new(question, command.user.id, timeout, &mut thread_rng());
    let round_id = command.id.get();

    let embed = embeds::create_trivia_embed(&round, timeout.as_secs());
    let components = buttons::create_trivia_buttons(round_id, round.options().len(), false);
    bot.trivia.start(round_id, round);

    let board = bot.trivia.clone();
    let http = ctx.http.clone();
    let interaction = command.clone();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        if let Some(round) = board.expire(round_id) {
            info!("⏰ Ronda de trivia {} expirada", round_id);
            let edit = EditInteractionResponse::new()
                .embed(embeds::create_trivia_result_embed(&round, TriviaResult::TimedOut))
                .components(buttons::create_trivia_buttons(round_id, round.options().len(), true));
            if let Err(e) = interaction.edit_response(&http, edit).await {
                warn!("No se pudo cerrar la ronda {}: {:?}", round_id, e);
            }
        }
    });

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().embed(embed).components(components),
        )
        .await?;

    Ok(())
}

async fn handle_weather(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
    city: &str,
) -> Result<(), CommandError> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let report = bot.weather.current(city).await.map_err(|e| {
        warn!("Error obteniendo clima para '{}': {:?}", city, e);
        CommandError::External(format!("Couldn't get the weather for **{}**.", city))
    })?;

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().embed(embeds::create_weather_embed(&report)),
        )
        .await?;

    Ok(())
}

async fn handle_wiki(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ChatBot,
    query: &str,
) -> Result<(), CommandError> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let content = match bot.wiki.lookup(query).await {
        Ok(Some(url)) => format!("📖 Here's the page: {}", url),
        Ok(None) => format!("🔎 No page found for **{}**.", query),
        Err(e) => {
            warn!("Error consultando la wiki para '{}': {:?}", query, e);
            return Err(CommandError::External("The wiki isn't answering right now.".to_string()));
        }
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;

    Ok(())
}

async fn handle_ping(ctx: &Context, command: &CommandInteraction) -> Result<(), CommandError> {
    let started = Instant::now();
    respond(ctx, command, message().content("🏓 Pong!")).await?;
    let round_trip = started.elapsed();

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .content(format!("🏓 Pong! `{} ms`", round_trip.as_millis())),
        )
        .await?;

    Ok(())
}

// Funciones auxiliares

fn message() -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
}

fn ephemeral(content: &str) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(message().content(content).ephemeral(true))
}

async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    message: CreateInteractionResponseMessage,
) -> Result<(), CommandError> {
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

/// Sends the error text, editing the deferred response if one was already sent.
async fn reply_error(
    ctx: &Context,
    command: &CommandInteraction,
    err: &CommandError,
) -> serenity::Result<()> {
    let content = err.user_message();

    let initial = CreateInteractionResponse::Message(message().content(&content).ephemeral(true));
    if command.create_response(&ctx.http, initial).await.is_err() {
        command
            .edit_response(
                &ctx.http,
                EditInteractionResponse::new().content(content).embeds(Vec::new()),
            )
            .await?;
    }

    Ok(())
}

fn require_guild(command: &CommandInteraction) -> Result<GuildId, CommandError> {
    command.guild_id.ok_or(CommandError::NotInGuild)
}

fn user_voice_channel(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<ChannelId, CommandError> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or_else(|| CommandError::Internal(anyhow::anyhow!("Guild no encontrada en caché")))?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(CommandError::NotInVoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn string(value: &str) -> CommandDataOptionValue {
        CommandDataOptionValue::String(value.to_string())
    }

    #[test]
    fn test_parse_number() {
        let (min, max) = (CommandDataOptionValue::Integer(1), CommandDataOptionValue::Integer(6));
        let options = [("min", &min), ("max", &max)];

        assert_eq!(
            BotCommand::parse("number", &options).unwrap(),
            BotCommand::Number { min: 1, max: 6 }
        );
    }

    #[test]
    fn test_parse_number_rejects_inverted_range() {
        let (min, max) = (CommandDataOptionValue::Integer(9), CommandDataOptionValue::Integer(2));
        let options = [("min", &min), ("max", &max)];

        let err = BotCommand::parse("number", &options).unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[test]
    fn test_parse_trims_text() {
        let city = string("  Lisbon ");
        assert_eq!(
            BotCommand::parse("weather", &[("city", &city)]).unwrap(),
            BotCommand::Weather { city: "Lisbon".to_string() }
        );
    }

    #[test]
    fn test_parse_rejects_blank_query() {
        let query = string("   ");
        assert!(matches!(
            BotCommand::parse("play", &[("query", &query)]),
            Err(CommandError::Validation(_))
        ));
        assert!(matches!(
            BotCommand::parse("play", &[]),
            Err(CommandError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_queue_page_defaults_to_first() {
        assert_eq!(BotCommand::parse("queue", &[]).unwrap(), BotCommand::Queue { page: 1 });
        let page = CommandDataOptionValue::Integer(3);
        assert_eq!(
            BotCommand::parse("queue", &[("page", &page)]).unwrap(),
            BotCommand::Queue { page: 3 }
        );
    }

    #[test]
    fn test_unknown_command_is_validation_error() {
        assert!(matches!(
            BotCommand::parse("dance", &[]),
            Err(CommandError::Validation(_))
        ));
    }

    #[test]
    fn test_music_commands_are_flagged() {
        assert!(BotCommand::Skip.is_music());
        assert!(BotCommand::Queue { page: 1 }.is_music());
        assert!(!BotCommand::Coin.is_music());
        assert!(!BotCommand::Trivia.is_music());
    }

    #[test]
    fn test_every_registered_command_parses() {
        let one = CommandDataOptionValue::Integer(1);
        let text = string("x");
        let options = [("min", &one), ("max", &one), ("query", &text), ("city", &text)];
        for spec in crate::bot::commands::COMMANDS {
            assert!(BotCommand::parse(spec.name, &options).is_ok(), "{}", spec.name);
        }
    }
}

use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

/// Name, usage and description of one slash command, shared by registration
/// and `/help`.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Music,
    Games,
    Utility,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "play", usage: "/play <query>", description: "Play a song from a YouTube link or search", category: Category::Music },
    CommandSpec { name: "queue", usage: "/queue [page]", description: "Show the playback queue", category: Category::Music },
    CommandSpec { name: "skip", usage: "/skip", description: "Skip to the next song", category: Category::Music },
    CommandSpec { name: "stop", usage: "/stop", description: "Stop playback and clear the queue", category: Category::Music },
    CommandSpec { name: "leave", usage: "/leave", description: "Leave the voice channel", category: Category::Music },
    CommandSpec { name: "shuffle", usage: "/shuffle", description: "Shuffle the upcoming songs", category: Category::Music },
    CommandSpec { name: "trivia", usage: "/trivia", description: "Answer a trivia question", category: Category::Games },
    CommandSpec { name: "fact", usage: "/fact", description: "Get a random fact", category: Category::Games },
    CommandSpec { name: "coin", usage: "/coin", description: "Flip a coin", category: Category::Games },
    CommandSpec { name: "number", usage: "/number <min> <max>", description: "Pick a random number between two values", category: Category::Games },
    CommandSpec { name: "weather", usage: "/weather <city>", description: "Current weather for a city", category: Category::Utility },
    CommandSpec { name: "wiki", usage: "/wiki <query>", description: "Find a Terraria wiki page", category: Category::Utility },
    CommandSpec { name: "ping", usage: "/ping", description: "Check the bot's latency", category: Category::Utility },
    CommandSpec { name: "help", usage: "/help", description: "List every command", category: Category::Utility },
];

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    serenity::model::application::Command::set_global_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

pub fn all_commands() -> Vec<CreateCommand> {
    COMMANDS.iter().map(build_command).collect()
}

fn build_command(spec: &CommandSpec) -> CreateCommand {
    let command = CreateCommand::new(spec.name).description(spec.description);

    match spec.name {
        "play" => command.add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "query",
                "YouTube link or search terms",
            )
            .required(true),
        ),
        "queue" => command.add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Page number")
                .min_int_value(1),
        ),
        "number" => command
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "min", "Lowest number")
                    .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "max", "Highest number")
                    .required(true),
            ),
        "weather" => command.add_option(
            CreateCommandOption::new(CommandOptionType::String, "city", "City name")
                .required(true),
        ),
        "wiki" => command.add_option(
            CreateCommandOption::new(CommandOptionType::String, "query", "Page to look for")
                .required(true),
        ),
        _ => command,
    }
}

use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
    model::id::UserId,
};
use std::time::Duration;

use crate::{
    audio::queue::{QueueInfo, QueueItem},
    bot::commands::{Category, COMMANDS},
    trivia::TriviaRound,
    utility::weather::WeatherReport,
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🤖 Chatter Bot";

const QUEUE_PAGE_SIZE: usize = 10;

// Límites de Discord
const FIELD_VALUE_LIMIT: usize = 1024;
const QUEUE_TITLE_LIMIT: usize = 60;

/// Crea un embed para mostrar la canción actual
pub fn create_now_playing_embed(track: &QueueItem) -> CreateEmbed {
    track_embed(track)
        .title("🎵 Now Playing")
        .color(colors::MUSIC_PURPLE)
}

/// Crea un embed para mostrar que se agregó una canción
pub fn create_track_added_embed(track: &QueueItem, position: usize) -> CreateEmbed {
    track_embed(track)
        .title("✅ Added to Queue")
        .color(colors::SUCCESS_GREEN)
        .field("📍 Position", position.to_string(), true)
}

pub fn create_playback_error_embed(track: &QueueItem) -> CreateEmbed {
    CreateEmbed::default()
        .title("❌ Playback Failed")
        .description(format!(
            "Couldn't play **{}**. Moving on to the next song.",
            track.title
        ))
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

fn track_embed(track: &QueueItem) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .description(format!("**[{}]({})**", track.title, track.url))
        .field(
            "🎤 Artist",
            track.source.artist().unwrap_or("Unknown"),
            true,
        );

    embed = match track.duration {
        Some(duration) => embed.field("⏱️ Duration", format_duration(duration), true),
        None => embed.field("⏱️ Duration", "🔴 Live", true),
    };

    embed = embed.field("👤 Requested by", format!("<@{}>", track.requested_by), true);

    if let Some(thumbnail) = track.source.thumbnail() {
        embed = embed.thumbnail(thumbnail);
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_queue_embed(queue_info: &QueueInfo, page: usize) -> CreateEmbed {
    let queue_page = queue_info.get_page(page, QUEUE_PAGE_SIZE);

    let mut embed = CreateEmbed::default()
        .title("📋 Playback Queue")
        .color(colors::INFO_BLUE);

    if queue_info.is_empty() {
        return embed
            .description("😴 **The queue is empty**\n\n💡 Use `/play <song>` to add music")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now());
    }

    if let Some(current) = &queue_info.current {
        embed = embed.field(
            "▶️ Now Playing",
            format!(
                "**{}** · <@{}>",
                truncate(&current.title, QUEUE_TITLE_LIMIT),
                current.requested_by
            ),
            false,
        );
    }

    if queue_page.items.is_empty() {
        embed = embed.field("⏭️ Up Next", "Nothing else queued", false);
    } else {
        let mut description = String::new();
        for (i, item) in queue_page.items.iter().enumerate() {
            let duration = item
                .duration
                .map(|dur| format!(" `[{}]`", format_duration(dur)))
                .unwrap_or_default();

            let line = format!(
                "**{}**. {}{}\n",
                queue_page.first_position + i,
                truncate(&item.title, QUEUE_TITLE_LIMIT),
                duration
            );
            if description.chars().count() + line.chars().count() > FIELD_VALUE_LIMIT {
                break;
            }
            description.push_str(&line);
        }
        embed = embed.field("⏭️ Up Next", description, false);
    }

    embed
        .field("🎶 Songs", queue_info.items.len().to_string(), true)
        .field(
            "⏱️ Total",
            humantime::format_duration(Duration::from_secs(queue_info.total_duration.as_secs()))
                .to_string(),
            true,
        )
        .footer(CreateEmbedFooter::new(format!(
            "Page {}/{} · {}",
            queue_page.current_page, queue_page.total_pages, STANDARD_FOOTER
        )))
        .timestamp(Timestamp::now())
}

pub fn create_help_embed() -> CreateEmbed {
    let section = |category: Category| {
        COMMANDS
            .iter()
            .filter(|spec| spec.category == category)
            .map(|spec| format!("`{}` - {}", spec.usage, spec.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::default()
        .title("🤖 Chatter Bot - Commands")
        .color(colors::INFO_BLUE)
        .field("🎵 Music", section(Category::Music), false)
        .field("🎲 Games", section(Category::Games), false)
        .field("🧰 Utility", section(Category::Utility), false)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

pub fn create_weather_embed(report: &WeatherReport) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("🌦️ Weather in {}", report.location))
        .description(&report.description)
        .color(colors::INFO_BLUE)
        .field("🌡️ Temperature", format!("{}°C", report.temperature_c), true)
        .field("🤔 Feels like", format!("{}°C", report.feels_like_c), true)
        .field("💧 Humidity", format!("{}%", report.humidity), true)
        .field("💨 Wind", format!("{} km/h", report.wind_kmph), true)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
        .timestamp(Timestamp::now())
}

pub fn create_trivia_embed(round: &TriviaRound, timeout_secs: u64) -> CreateEmbed {
    let question = round.question();
    CreateEmbed::default()
        .title("❓ Trivia Time")
        .description(format!("**{}**\n\n{}", question.question, numbered_options(round)))
        .color(colors::WARNING_ORANGE)
        .field("📚 Category", &question.category, true)
        .field("🎯 Difficulty", &question.difficulty, true)
        .footer(CreateEmbedFooter::new(format!(
            "You have {} seconds · {}",
            timeout_secs, STANDARD_FOOTER
        )))
}

/// How a round ended, for [`create_trivia_result_embed`].
#[derive(Debug, Clone, Copy)]
pub enum TriviaResult {
    Correct(UserId),
    Wrong(UserId),
    TimedOut,
}

pub fn create_trivia_result_embed(round: &TriviaRound, result: TriviaResult) -> CreateEmbed {
    let (title, verdict, color) = match result {
        TriviaResult::Correct(user) => (
            "🎉 Correct!",
            format!("<@{}> got it right!", user),
            colors::SUCCESS_GREEN,
        ),
        TriviaResult::Wrong(user) => (
            "❌ Nope",
            format!(
                "<@{}> missed it. The correct answer was **{}**.",
                user,
                round.correct_answer()
            ),
            colors::ERROR_RED,
        ),
        TriviaResult::TimedOut => (
            "⏰ Time's Up",
            format!("The correct answer was **{}**.", round.correct_answer()),
            colors::NEUTRAL_GRAY,
        ),
    };

    CreateEmbed::default()
        .title(title)
        .description(format!(
            "**{}**\n\n{}\n\n{}",
            round.question().question,
            numbered_options(round),
            verdict
        ))
        .color(color)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

fn numbered_options(round: &TriviaRound) -> String {
    round
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| format!("**{}.** {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cuts `text` to at most `max` characters, ending in an ellipsis when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::queue::GuildQueue, sources::TrackSource};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(65)), "1:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_duration(Duration::ZERO), "0:00");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ñññññ", 5), "ñññññ");
    }

    #[test]
    fn test_full_queue_page_fits_field_limits() {
        let mut queue = GuildQueue::new(50);
        for i in 0..11 {
            let title = format!("{:0>3} {}", i, "x".repeat(96));
            let track = TrackSource::new(title, format!("https://youtu.be/{}", i), UserId::new(1))
                .with_duration(Duration::from_secs(3725));
            queue.push(track).unwrap();
        }
        queue.advance();

        let embed = create_queue_embed(&queue.snapshot(), 1);
        let json = serde_json::to_value(&embed).unwrap();
        let fields = json["fields"].as_array().unwrap();

        assert!(!fields.is_empty());
        for field in fields {
            let value = field["value"].as_str().unwrap();
            assert!(value.chars().count() <= FIELD_VALUE_LIMIT, "{} chars", value.chars().count());
        }
        let up_next = fields.iter().find(|f| f["name"] == "⏭️ Up Next").unwrap();
        assert_eq!(up_next["value"].as_str().unwrap().lines().count(), 10);
    }
}

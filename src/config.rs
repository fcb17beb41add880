use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

const MAX_RATE_LIMIT_PER_USER: u32 = 10_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Para registrar comandos en un solo servidor
    pub production: bool,

    // Health endpoint
    pub port: u16,

    // Límites
    pub rate_limit_per_user: u32,  // Comandos por ventana
    pub rate_limit_window_secs: u64,
    pub max_queue_size: usize,
    pub trivia_timeout_secs: u64,

    // Paths
    pub log_dir: PathBuf,
    pub word_list_path: PathBuf,
    pub dictionary_path: PathBuf, // Hunspell, sin extensión

    // Servicios externos
    pub weather_api_url: String,
    pub trivia_api_url: String,

    // Features
    pub enable_spellcheck: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("No se pudo crear el directorio de logs {}", config.log_dir.display())
        })?;

        Ok(config)
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// `load()` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            discord_token: lookup("DISCORD_TOKEN").unwrap_or_default(),
            guild_id: lookup("GUILD_ID")
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse())
                .transpose()
                .context("GUILD_ID must be a numeric guild id")?,
            production: parse_or(&lookup, "PRODUCTION", defaults.production)?,

            port: parse_or(&lookup, "PORT", defaults.port)?,

            rate_limit_per_user: parse_or(&lookup, "RATE_LIMIT_PER_USER", defaults.rate_limit_per_user)?,
            rate_limit_window_secs: parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            max_queue_size: parse_or(&lookup, "MAX_QUEUE_SIZE", defaults.max_queue_size)?,
            trivia_timeout_secs: parse_or(&lookup, "TRIVIA_TIMEOUT_SECS", defaults.trivia_timeout_secs)?,

            log_dir: lookup("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            word_list_path: lookup("WORD_LIST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.word_list_path),
            dictionary_path: lookup("SPELLCHECK_DICTIONARY")
                .map(PathBuf::from)
                .unwrap_or(defaults.dictionary_path),

            weather_api_url: lookup("WEATHER_API_URL").unwrap_or(defaults.weather_api_url),
            trivia_api_url: lookup("TRIVIA_API_URL").unwrap_or(defaults.trivia_api_url),

            enable_spellcheck: parse_or(&lookup, "ENABLE_SPELLCHECK", defaults.enable_spellcheck)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The Discord token must be present; the bot cannot start without it
    /// - The health port must be non-zero
    /// - The rate limit ceiling must be at most 10 000 commands per window
    /// - The rate limit window and queue size must be greater than 0
    /// - The trivia timeout must be between 5 and 300 seconds
    ///
    /// # Returns
    ///
    /// - `Ok(())`: All values are valid
    /// - `Err(anyhow::Error)`: Invalid configuration detected
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN is not set; the bot cannot authenticate");
        }

        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.rate_limit_per_user > MAX_RATE_LIMIT_PER_USER {
            anyhow::bail!(
                "Rate limit must be at most {} commands, got: {}",
                MAX_RATE_LIMIT_PER_USER,
                self.rate_limit_per_user
            );
        }

        if self.rate_limit_window_secs == 0 {
            anyhow::bail!("Rate limit window must be greater than 0");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if !(5..=300).contains(&self.trivia_timeout_secs) {
            anyhow::bail!(
                "Trivia timeout must be between 5 and 300 seconds, got: {}",
                self.trivia_timeout_secs
            );
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: commands {} ({} mode)\n  \
            Health: port {}\n  \
            Limits: {} commands / {}s per user, {} queued tracks, {}s trivia\n  \
            Logs: {}\n  \
            Features: spellcheck={}",
            self.guild_id
                .map_or("global".to_string(), |id| format!("in guild {}", id)),
            if self.production { "production" } else { "development" },
            self.port,
            self.rate_limit_per_user,
            self.rate_limit_window_secs,
            self.max_queue_size,
            self.trivia_timeout_secs,
            self.log_dir.display(),
            self.enable_spellcheck,
        )
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no default token - must be provided)
            discord_token: String::new(),
            guild_id: None,
            production: false,

            port: 5000,

            rate_limit_per_user: 20,
            rate_limit_window_secs: 60,
            max_queue_size: 100,
            trivia_timeout_secs: 30,

            log_dir: "logs".into(),
            word_list_path: "addedwords.txt".into(),
            dictionary_path: "/usr/share/hunspell/en_US".into(),

            weather_api_url: "https://wttr.in".to_string(),
            trivia_api_url: "https://opentdb.com/api.php".to_string(),

            enable_spellcheck: false,
        }
    }
}

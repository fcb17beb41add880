use anyhow::{Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "bot.log";

/// Installs the global subscriber: stdout plus an append-only file in `log_dir`.
///
/// A non-empty `RUST_LOG` replaces the default directives entirely.
pub fn init(log_dir: &Path, production: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
        .with_context(|| format!("No se pudo abrir el log en {}", log_dir.display()))?;

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), production)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()?;

    Ok(())
}

fn default_directives(production: bool) -> String {
    let own_level = if production { "info" } else { "debug" };
    format!("chatter_bot={},serenity=info,songbird=info", own_level)
}

fn build_filter(rust_log: Option<&str>, production: bool) -> Result<EnvFilter> {
    let directives = match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(user) => user.to_string(),
        None => default_directives(production),
    };

    EnvFilter::try_new(&directives)
        .with_context(|| format!("Directivas de log inválidas: {}", directives))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_replaces_defaults() {
        let filter = build_filter(Some("songbird=trace,warn"), true).unwrap().to_string();
        assert!(filter.contains("songbird=trace"), "{}", filter);
        assert!(!filter.contains("songbird=info"), "{}", filter);
        assert!(!filter.contains("chatter_bot"), "{}", filter);
    }

    #[test]
    fn test_defaults_when_rust_log_unset_or_blank() {
        for rust_log in [None, Some(""), Some("  ")] {
            let filter = build_filter(rust_log, false).unwrap().to_string();
            assert!(filter.contains("chatter_bot=debug"), "{}", filter);
            assert!(filter.contains("songbird=info"), "{}", filter);
        }
        let filter = build_filter(None, true).unwrap().to_string();
        assert!(filter.contains("chatter_bot=info"), "{}", filter);
    }
}

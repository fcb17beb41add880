//! Playful spelling watcher for guild messages.
//!
//! Words are checked against a Hunspell dictionary. Words listed in the user
//! word list (one per line) count as known even when the dictionary lacks them.

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, Rng};
use regex::Regex;
use spellbook::Dictionary;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::{debug, info};

const REPLIES: &[&str] = &[
    "Let's try that again, shall we?",
    "Learn to spell, Sandwich.",
    "Read a book, Schmuck!",
    "Seems like your dictionary took a vacation, pal!",
    "Even your keyboard is questioning your grammar, genius.",
    "Autocorrect just waved the white flag, rookie.",
    "Are you inventing a new language? Because that's something else!",
    "Spell check is tapping out. Maybe it's time for a lesson!",
];

pub struct SpellingWatcher {
    dictionary: Dictionary,
    allowed: HashSet<String>,
}

impl SpellingWatcher {
    pub fn new(dictionary: Dictionary, allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            dictionary,
            allowed: allowed
                .into_iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Builds a watcher from the text of a Hunspell `.aff`/`.dic` pair.
    pub fn from_hunspell(
        aff: &str,
        dic: &str,
        allowed: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let dictionary = Dictionary::new(aff, dic)
            .map_err(|e| anyhow::anyhow!("Diccionario Hunspell inválido: {}", e))?;
        Ok(Self::new(dictionary, allowed))
    }

    /// Loads `<dictionary>.aff` and `<dictionary>.dic`, plus the word list if
    /// it exists. A missing word list means no extra words.
    pub fn load(dictionary: &Path, word_list: &Path) -> Result<Self> {
        let aff_path = with_suffix(dictionary, "aff");
        let dic_path = with_suffix(dictionary, "dic");

        let aff = std::fs::read_to_string(&aff_path)
            .with_context(|| format!("No se pudo leer {}", aff_path.display()))?;
        let dic = std::fs::read_to_string(&dic_path)
            .with_context(|| format!("No se pudo leer {}", dic_path.display()))?;

        let extra = if word_list.exists() {
            std::fs::read_to_string(word_list)
                .with_context(|| format!("No se pudo leer {}", word_list.display()))?
                .lines()
                .map(str::to_string)
                .collect()
        } else {
            debug!("📄 Sin lista de palabras en {}", word_list.display());
            Vec::new()
        };

        let watcher = Self::from_hunspell(&aff, &dic, extra)?;
        info!(
            "📖 Diccionario cargado desde {} ({} palabras extra)",
            dictionary.display(),
            watcher.allowed.len()
        );
        Ok(watcher)
    }

    /// Returns every unknown word once, in message order.
    ///
    /// Links, mentions, emoji and tokens containing digits are skipped.
    pub fn check(&self, text: &str) -> Vec<String> {
        static WORDS: OnceLock<Regex> = OnceLock::new();
        let words = WORDS.get_or_init(|| Regex::new(r"[\w']+").expect("static regex"));

        let mut seen = HashSet::new();
        text.split_whitespace()
            .filter(|chunk| !is_markup(chunk))
            .flat_map(|chunk| words.find_iter(chunk))
            .map(|m| m.as_str().trim_matches('\''))
            .filter(|word| !word.is_empty())
            .filter(|word| !word.chars().any(|c| c.is_numeric() || c == '_'))
            .filter(|word| !self.is_known(word))
            .filter(|word| seen.insert(word.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    fn is_known(&self, word: &str) -> bool {
        self.allowed.contains(&word.to_lowercase()) || self.dictionary.check(word)
    }

    pub fn reply<R: Rng + ?Sized>(&self, flagged: &[String], rng: &mut R) -> String {
        let jab = REPLIES.choose(rng).copied().unwrap_or(REPLIES[0]);
        let words = flagged
            .iter()
            .map(|word| format!("~~{}~~", word))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} ({})", jab, words)
    }
}

fn is_markup(chunk: &str) -> bool {
    chunk.starts_with("http://")
        || chunk.starts_with("https://")
        || (chunk.starts_with('<') && chunk.ends_with('>'))
        || (chunk.len() > 1 && chunk.starts_with(':') && chunk.ends_with(':'))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", path.display(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    const AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwz'\n";
    const DIC: &str = "6\nhello\nworld\nthe\nmail\nI\nreceive\n";

    fn watcher(extra: &[&str]) -> SpellingWatcher {
        SpellingWatcher::from_hunspell(AFF, DIC, extra.iter().map(|w| w.to_string())).unwrap()
    }

    #[test]
    fn test_unknown_words_are_flagged_once() {
        let flagged = watcher(&[]).check("I recieve teh mail, Teh end");
        assert_eq!(flagged, vec!["recieve", "teh", "end"]);
    }

    #[test]
    fn test_dictionary_words_are_not_flagged() {
        assert!(watcher(&[]).check("Hello world, I receive the mail").is_empty());
    }

    #[test]
    fn test_word_list_counts_as_known() {
        let watcher = watcher(&["Yeet", ""]);
        assert!(watcher.check("yeet the mail").is_empty());
        assert_eq!(watcher.check("yeet the mial"), vec!["mial"]);
    }

    #[test]
    fn test_links_mentions_and_numbers_are_skipped() {
        let flagged = watcher(&[]).check("hello <@123> https://youtu.be/xyz :smile: 42nd mail");
        assert!(flagged.is_empty(), "{:?}", flagged);
    }

    #[test]
    fn test_reply_names_flagged_words() {
        let watcher = watcher(&[]);
        let flagged = watcher.check("wierd");
        let reply = watcher.reply(&flagged, &mut StdRng::seed_from_u64(1));
        assert!(reply.contains("~~wierd~~"));
    }

    #[test]
    fn test_missing_dictionary_is_an_error() {
        let result = SpellingWatcher::load(
            Path::new("/definitely/not/here/en_US"),
            Path::new("/definitely/not/here.txt"),
        );
        assert!(result.is_err());
    }
}

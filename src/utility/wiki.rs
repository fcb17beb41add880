use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

const WIKI_BASE_URL: &str = "https://terraria.wiki.gg/wiki";

/// Looks up entity pages on the Terraria wiki.
pub struct WikiClient {
    client: reqwest::Client,
}

impl WikiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Returns the page URL when the wiki has a page for `query`.
    pub async fn lookup(&self, query: &str) -> Result<Option<String>> {
        let url = page_url(query);
        debug!("📖 Buscando página: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Wiki unreachable")?;

        Ok(response.status().is_success().then_some(url))
    }
}

impl Default for WikiClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn page_url(query: &str) -> String {
    let title = query.trim().split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}/{}", WIKI_BASE_URL, urlencoding::encode(&title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_uses_underscores() {
        assert_eq!(
            page_url("  Eye of  Cthulhu "),
            "https://terraria.wiki.gg/wiki/Eye_of_Cthulhu"
        );
        assert_eq!(page_url("Zenith"), "https://terraria.wiki.gg/wiki/Zenith");
    }
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;
use verse_clock_core::{AttemptPolicy, VerseCatalog};

/// Settings for talking to the verse service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the verse service, e.g. `https://bible-api.com`.
    pub service_url: String,
    /// Relay that wraps service responses in a `{"contents": ..}` envelope.
    /// `None` queries the service directly.
    pub relay_url: Option<String>,
    /// Translation id sent to the service.
    pub translation: String,
    /// Label shown when the payload does not name its translation.
    pub translation_label: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_url: "https://bible-api.com".into(),
            relay_url: Some("https://api.allorigins.win/get".into()),
            translation: "kjv".into(),
            translation_label: "KJV".into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// How the presenter writes outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone)]
pub struct ClockConfig {
    pub catalog: CatalogSource,
    pub service: ServiceConfig,

    /// Attempt bound for the visible run; 0 tries every candidate.
    pub foreground_attempts: usize,
    /// Pause between background attempts.
    pub attempt_delay: Duration,
    /// Wait after a display before the next-minute prefetch starts.
    pub prefetch_delay: Duration,

    pub tick: Duration,
    pub fade: Duration,
    pub output: OutputFormat,
}

impl ClockConfig {
    pub fn foreground_policy(&self) -> AttemptPolicy {
        AttemptPolicy::foreground(self.foreground_attempts)
    }

    pub fn background_policy(&self) -> AttemptPolicy {
        AttemptPolicy::background(self.attempt_delay)
    }
}

/// Where the book/chapter catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` and `https://` strings are URLs; anything else is a path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::File(PathBuf::from(s))
        }
    }

    pub async fn load(&self, client: &Client) -> Result<VerseCatalog> {
        let catalog = match self {
            CatalogSource::File(path) => {
                let s = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("read {}", path.display()))?;
                VerseCatalog::load(&s).with_context(|| format!("parse {}", path.display()))?
            }
            CatalogSource::Url(url) => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("catalog request")?
                    .error_for_status()
                    .context("catalog status")?
                    .text()
                    .await
                    .context("catalog body")?;
                VerseCatalog::load(&body).with_context(|| format!("parse {url}"))?
            }
        };
        info!(books = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_source_detects_urls() {
        assert_eq!(
            CatalogSource::parse("https://example.org/bible.json"),
            CatalogSource::Url("https://example.org/bible.json".into())
        );
        assert_eq!(
            CatalogSource::parse("data/bible.json"),
            CatalogSource::File(PathBuf::from("data/bible.json"))
        );
    }

    #[test]
    fn zero_foreground_attempts_is_unbounded() {
        let cfg = ClockConfig {
            catalog: CatalogSource::parse("bible.json"),
            service: ServiceConfig::default(),
            foreground_attempts: 0,
            attempt_delay: Duration::from_millis(250),
            prefetch_delay: Duration::from_secs(1),
            tick: Duration::from_secs(1),
            fade: Duration::from_millis(500),
            output: OutputFormat::Text,
        };
        assert_eq!(cfg.foreground_policy().max_attempts, None);
        assert_eq!(cfg.background_policy().delay_between, Duration::from_millis(250));
    }
}

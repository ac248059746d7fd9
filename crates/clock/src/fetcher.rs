//! Single-verse lookups against the remote verse service.
//!
//! Every failure is soft: callers only ever see `Some(verse)` or `None`.

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use verse_clock_core::{ClockTarget, VerseResult};

use crate::config::ServiceConfig;

/// Looks up one verse. Implementations must not panic or error; any problem
/// becomes `None` so the caller can move on to the next candidate.
#[async_trait]
pub trait VerseFetcher: Send + Sync {
    async fn fetch(&self, book: &str, target: ClockTarget) -> Option<VerseResult>;
}

/// Why a lookup produced nothing. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum FetchSoftFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited by {0}")]
    RateLimited(&'static str),
    #[error("{0} answered with status {1}")]
    Status(&'static str, u16),
    #[error("malformed relay envelope: {0}")]
    Envelope(String),
    #[error("verse not found")]
    NotFound,
    #[error("malformed verse payload: {0}")]
    Payload(String),
    #[error("verse payload missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    status: Option<EnvelopeStatus>,
}

#[derive(Deserialize)]
struct EnvelopeStatus {
    #[serde(default)]
    http_code: Option<u16>,
}

#[derive(Deserialize)]
struct VersePayload {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    translation_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`VerseFetcher`] backed by the bible-api style HTTP service, optionally
/// through an envelope relay.
#[derive(Debug, Clone)]
pub struct HttpVerseFetcher {
    client: Client,
    service_url: Url,
    relay_url: Option<Url>,
    translation: String,
    translation_label: String,
}

impl HttpVerseFetcher {
    /// Builds a client with the configured timeout.
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("build http client")?;
        Self::with_client(client, config)
    }

    /// Uses an existing client; URLs are validated here.
    pub fn with_client(client: Client, config: &ServiceConfig) -> anyhow::Result<Self> {
        let service_url = Url::parse(&config.service_url)
            .with_context(|| format!("invalid service url {}", config.service_url))?;
        if service_url.cannot_be_a_base() {
            bail!("service url {service_url} cannot take a path");
        }
        let relay_url = config
            .relay_url
            .as_deref()
            .map(|r| Url::parse(r).with_context(|| format!("invalid relay url {r}")))
            .transpose()?;
        Ok(Self {
            client,
            service_url,
            relay_url,
            translation: config.translation.clone(),
            translation_label: config.translation_label.clone(),
        })
    }

    /// `{service}/{reference}?translation={id}` with the reference percent-encoded.
    pub fn service_url_for(&self, reference: &str) -> Url {
        let mut url = self.service_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(reference);
        }
        url.query_pairs_mut()
            .append_pair("translation", &self.translation);
        url
    }

    /// The URL actually requested: the relay wrapping the service URL, or the
    /// service URL itself.
    pub fn request_url_for(&self, reference: &str) -> Url {
        let direct = self.service_url_for(reference);
        match &self.relay_url {
            Some(relay) => {
                let mut url = relay.clone();
                url.query_pairs_mut().append_pair("url", direct.as_str());
                url
            }
            None => direct,
        }
    }

    async fn try_fetch(&self, reference: &str) -> Result<VerseResult, FetchSoftFailure> {
        let url = self.request_url_for(reference);
        let hop = if self.relay_url.is_some() { "relay" } else { "service" };

        let resp = self.client.get(url).send().await?;
        check_status(hop, resp.status())?;
        let body = resp.text().await?;

        let contents = if self.relay_url.is_some() {
            decode_envelope(&body)?
        } else {
            body
        };
        decode_payload(&contents, &self.translation_label)
    }
}

#[async_trait]
impl VerseFetcher for HttpVerseFetcher {
    async fn fetch(&self, book: &str, target: ClockTarget) -> Option<VerseResult> {
        let reference = target.reference(book);
        match self.try_fetch(&reference).await {
            Ok(verse) => {
                debug!(%reference, "verse fetched");
                Some(verse)
            }
            Err(FetchSoftFailure::NotFound) => {
                debug!(%reference, "verse not found");
                None
            }
            Err(e @ FetchSoftFailure::RateLimited(_)) => {
                warn!(%reference, "{e}; trying next candidate");
                None
            }
            Err(e) => {
                warn!(%reference, error = %e, "verse fetch failed");
                None
            }
        }
    }
}

fn check_status(hop: &'static str, status: StatusCode) -> Result<(), FetchSoftFailure> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(FetchSoftFailure::RateLimited(hop))
    } else if status == StatusCode::NOT_FOUND && hop == "service" {
        Err(FetchSoftFailure::NotFound)
    } else {
        Err(FetchSoftFailure::Status(hop, status.as_u16()))
    }
}

/// Unwraps the relay envelope and returns the inner document as text.
pub fn decode_envelope(body: &str) -> Result<String, FetchSoftFailure> {
    let env: Envelope =
        serde_json::from_str(body).map_err(|e| FetchSoftFailure::Envelope(e.to_string()))?;

    if let Some(code) = env.status.and_then(|s| s.http_code) {
        let status = StatusCode::from_u16(code)
            .map_err(|_| FetchSoftFailure::Envelope(format!("bad http_code {code}")))?;
        check_status("service", status)?;
    }

    match env.contents {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(FetchSoftFailure::Envelope("missing contents".into())),
    }
}

/// Decodes the service payload into a verse.
pub fn decode_payload(contents: &str, default_label: &str) -> Result<VerseResult, FetchSoftFailure> {
    let payload: VersePayload = match serde_json::from_str(contents) {
        Ok(p) => p,
        Err(e) => {
            let lower = contents.to_ascii_lowercase();
            if lower.contains("not found") {
                return Err(FetchSoftFailure::NotFound);
            }
            if lower.contains("<html") {
                return Err(FetchSoftFailure::Payload("html error page".into()));
            }
            return Err(FetchSoftFailure::Payload(e.to_string()));
        }
    };

    if payload.error.is_some() {
        return Err(FetchSoftFailure::NotFound);
    }

    let reference_text = payload
        .reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or(FetchSoftFailure::MissingField("reference"))?;
    let body_text = payload
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(FetchSoftFailure::MissingField("text"))?;
    let translation_label = payload
        .translation_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| default_label.to_string());

    Ok(VerseResult {
        reference_text,
        body_text,
        translation_label,
    })
}

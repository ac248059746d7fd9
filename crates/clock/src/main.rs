use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use verse_clock::{
    clock::{ClockDriver, ClockSource, FixedClock, LocalClock},
    config::{CatalogSource, ClockConfig, OutputFormat, ServiceConfig},
    fetcher::HttpVerseFetcher,
    pipeline::VersePipeline,
    present::{JsonPresenter, Presenter, TextPresenter},
};
use verse_clock_core::ClockTime;

#[derive(Debug, Parser)]
#[command(name = "verse-clock", version, about = "Shows the Bible verse matching the time of day")]
struct Cli {
    /// Book/chapter catalog: a JSON file path or an http(s) URL.
    #[arg(long, default_value = "bible.json")]
    catalog: String,

    /// Verse service base URL.
    #[arg(long, default_value = "https://bible-api.com")]
    service_url: String,

    /// Relay that wraps service responses in a JSON envelope.
    #[arg(long, default_value = "https://api.allorigins.win/get")]
    relay_url: String,

    /// Query the verse service directly instead of through the relay.
    #[arg(long, default_value_t = false)]
    no_relay: bool,

    /// Translation id sent to the verse service.
    #[arg(long, default_value = "kjv")]
    translation: String,

    /// Label shown when the service does not name the translation.
    #[arg(long, default_value = "KJV")]
    translation_label: String,

    /// Max books tried for the visible minute (0 = all).
    #[arg(long, default_value_t = 3)]
    foreground_attempts: usize,

    /// Delay between background prefetch attempts.
    #[arg(long, default_value_t = 250)]
    attempt_delay_ms: u64,

    /// Delay after a display before the next minute is prefetched.
    #[arg(long, default_value_t = 1000)]
    prefetch_delay_ms: u64,

    /// HTTP request timeout.
    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// Clock poll interval. Must be at most one second.
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Pause before each display change.
    #[arg(long, default_value_t = 500)]
    fade_ms: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Resolve a single minute and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// With --once, the time to resolve (HH:MM) instead of now.
    #[arg(long, requires = "once", value_parser = parse_hh_mm)]
    at: Option<ClockTime>,

    /// Log level (env-filter syntax). RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log: String,
}

fn parse_hh_mm(s: &str) -> Result<ClockTime, String> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got {s:?}"))?;
    let hour: u8 = h.trim().parse().map_err(|_| format!("bad hour {h:?}"))?;
    let minute: u8 = m.trim().parse().map_err(|_| format!("bad minute {m:?}"))?;
    ClockTime::new(hour, minute).ok_or_else(|| format!("{s} is not a time of day"))
}

impl Cli {
    fn into_config(self) -> Result<ClockConfig> {
        if self.tick_ms == 0 || self.tick_ms > 1000 {
            bail!("--tick-ms must be between 1 and 1000, got {}", self.tick_ms);
        }
        Ok(ClockConfig {
            catalog: CatalogSource::parse(&self.catalog),
            service: ServiceConfig {
                service_url: self.service_url,
                relay_url: (!self.no_relay).then_some(self.relay_url),
                translation: self.translation,
                translation_label: self.translation_label,
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            foreground_attempts: self.foreground_attempts,
            attempt_delay: Duration::from_millis(self.attempt_delay_ms),
            prefetch_delay: Duration::from_millis(self.prefetch_delay_ms),
            tick: Duration::from_millis(self.tick_ms),
            fade: Duration::from_millis(self.fade_ms),
            output: self.output,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let once = cli.once;
    let at = cli.at;
    let config = cli.into_config()?;
    info!("starting verse clock with config: {:?}", config);

    let client = reqwest::Client::builder()
        .timeout(config.service.request_timeout)
        .build()
        .context("build http client")?;
    let fetcher = HttpVerseFetcher::with_client(client.clone(), &config.service)?;

    let catalog = match config.catalog.load(&client).await {
        Ok(c) => c,
        Err(e) => {
            error!("catalog load failed: {e:#}");
            eprintln!("Error loading Bible data. Please ensure the catalog is available.");
            return Err(e.context("verse clock not started"));
        }
    };

    let pipeline = VersePipeline::new(Arc::new(catalog), Arc::new(fetcher))
        .with_policies(config.foreground_policy(), config.background_policy())
        .with_prefetch_delay(config.prefetch_delay);

    let presenter: Arc<dyn Presenter> = match config.output {
        OutputFormat::Text => Arc::new(TextPresenter::stdout(config.fade)),
        OutputFormat::Json => Arc::new(JsonPresenter::stdout()),
    };

    let clock: Arc<dyn ClockSource> = match at {
        Some(t) => Arc::new(FixedClock(t)),
        None => Arc::new(LocalClock),
    };

    let driver = ClockDriver::new(pipeline, presenter, Arc::clone(&clock), config.tick);

    if once {
        driver.show(clock.now()).await?;
        return Ok(());
    }

    driver.run_until(shutdown_signal()).await
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}

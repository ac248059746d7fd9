//! Output sinks for display outcomes.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use verse_clock_core::{ClockTime, DisplayOutcome};

/// Renders one outcome. `at` is the minute the outcome was produced for.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn present(&self, at: ClockTime, outcome: &DisplayOutcome) -> Result<()>;
}

/// Text rendering of an outcome, matching the browser clock's messages.
pub fn render_text(at: ClockTime, outcome: &DisplayOutcome) -> String {
    match outcome {
        DisplayOutcome::VerseFound(v) => {
            format!("{}\n— {}\n{}\n", v.body_text, v.reference_text, v.translation_label)
        }
        DisplayOutcome::NoVerseAvailable(target) => format!(
            "There are no Bible verses that match {at}.\n(Chapter {}, Verse {:02})\n— No verse available\n",
            target.chapter, target.verse
        ),
        DisplayOutcome::HourMark { hour } => format!(
            "It's {hour:02}:00. No 'verse 0' exists.\nWaiting for the next minute...\n— Hour Mark\n"
        ),
    }
}

/// Writes text blocks to a writer after a short transition pause.
pub struct TextPresenter<W> {
    out: Mutex<W>,
    fade: Duration,
}

impl TextPresenter<std::io::Stdout> {
    pub fn stdout(fade: Duration) -> Self {
        Self::new(std::io::stdout(), fade)
    }
}

impl<W: Write + Send> TextPresenter<W> {
    pub fn new(out: W, fade: Duration) -> Self {
        Self {
            out: Mutex::new(out),
            fade,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| anyhow!("presenter writer poisoned"))
    }
}

#[async_trait]
impl<W: Write + Send> Presenter for TextPresenter<W> {
    async fn present(&self, at: ClockTime, outcome: &DisplayOutcome) -> Result<()> {
        if !self.fade.is_zero() {
            tokio::time::sleep(self.fade).await;
        }
        let text = render_text(at, outcome);
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("presenter writer poisoned"))?;
        writeln!(out, "[{at}]\n{text}").context("write outcome")?;
        out.flush().context("flush outcome")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time: ClockTime,
    #[serde(flatten)]
    outcome: &'a DisplayOutcome,
}

/// One JSON object per outcome, newline separated.
pub struct JsonPresenter<W> {
    out: Mutex<W>,
}

impl JsonPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| anyhow!("presenter writer poisoned"))
    }
}

#[async_trait]
impl<W: Write + Send> Presenter for JsonPresenter<W> {
    async fn present(&self, at: ClockTime, outcome: &DisplayOutcome) -> Result<()> {
        let line = serde_json::to_string(&JsonLine { time: at, outcome })?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("presenter writer poisoned"))?;
        writeln!(out, "{line}").context("write outcome")?;
        out.flush().context("flush outcome")?;
        Ok(())
    }
}

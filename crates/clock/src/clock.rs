//! Wall-clock polling and the main display loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Timelike;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use verse_clock_core::{ClockTime, DisplayOutcome};

use crate::pipeline::{PrefetchHandle, VersePipeline};
use crate::present::Presenter;

pub trait ClockSource: Send + Sync {
    fn now(&self) -> ClockTime;
}

/// Local time zone wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl ClockSource for LocalClock {
    fn now(&self) -> ClockTime {
        let now = chrono::Local::now();
        // chrono keeps hour < 24 and minute < 60.
        ClockTime {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }
}

/// Always reports the same time. Used for one-shot lookups.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockTime);

impl ClockSource for FixedClock {
    fn now(&self) -> ClockTime {
        self.0
    }
}

/// Reports each minute boundary once. The first observation always counts.
#[derive(Debug, Default)]
pub struct MinuteWatcher {
    last: Option<ClockTime>,
}

impl MinuteWatcher {
    pub fn observe(&mut self, now: ClockTime) -> Option<ClockTime> {
        if self.last == Some(now) {
            return None;
        }
        self.last = Some(now);
        Some(now)
    }
}

/// Drives the pipeline from a clock source and feeds a presenter.
pub struct ClockDriver {
    pipeline: VersePipeline,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn ClockSource>,
    tick: Duration,
}

impl ClockDriver {
    pub fn new(
        pipeline: VersePipeline,
        presenter: Arc<dyn Presenter>,
        clock: Arc<dyn ClockSource>,
        tick: Duration,
    ) -> Self {
        Self {
            pipeline,
            presenter,
            clock,
            tick,
        }
    }

    /// Resolves and presents a single minute.
    pub async fn show(&self, at: ClockTime) -> Result<DisplayOutcome> {
        let outcome = self.pipeline.run(at).await;
        self.presenter.present(at, &outcome).await?;
        Ok(outcome)
    }

    /// Polls the clock until `shutdown` resolves. Every new minute is resolved,
    /// presented, and followed by a prefetch of the minute after it.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut watcher = MinuteWatcher::default();
        let mut pending: Option<PrefetchHandle> = None;
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => break Ok(()),
                _ = ticker.tick() => {
                    let Some(now) = watcher.observe(self.clock.now()) else {
                        continue;
                    };
                    info!(time = %now, "minute boundary");
                    let shown = tokio::select! {
                        _ = &mut shutdown => break Ok(()),
                        shown = self.show(now) => shown,
                    };
                    if let Err(e) = shown {
                        break Err(e);
                    }
                    let handle = self.pipeline.schedule_prefetch(now.next_minute()).await;
                    debug!(next = %handle.next(), "prefetch scheduled");
                    pending = Some(handle);
                }
            }
        };

        if let Some(handle) = pending {
            handle.abort();
        }
        self.pipeline.shutdown().await;
        info!("clock stopped");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watcher_fires_once_per_minute() {
        let mut w = MinuteWatcher::default();
        let a = ClockTime::new(9, 0).unwrap();
        let b = ClockTime::new(9, 1).unwrap();
        assert_eq!(w.observe(a), Some(a));
        assert_eq!(w.observe(a), None);
        assert_eq!(w.observe(a), None);
        assert_eq!(w.observe(b), Some(b));
        assert_eq!(w.observe(b), None);
    }

    #[test]
    fn local_clock_is_in_range() {
        let now = LocalClock.now();
        assert!(ClockTime::new(now.hour, now.minute).is_some());
    }
}

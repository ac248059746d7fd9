//! Per-minute verse resolution.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use verse_clock_core::{
    draw_order, AttemptPolicy, ClockTarget, ClockTime, DisplayOutcome, RunKind, VerseCatalog,
    VerseResult,
};

use crate::fetcher::VerseFetcher;
use crate::prefetch::{CycleTicket, PrefetchCache};

/// Resolves the verse for a minute and prefetches the next one.
///
/// Cheap to clone; clones share the catalog, fetcher and cache.
#[derive(Clone)]
pub struct VersePipeline {
    catalog: Arc<VerseCatalog>,
    fetcher: Arc<dyn VerseFetcher>,
    cache: Arc<PrefetchCache>,
    foreground: AttemptPolicy,
    background: AttemptPolicy,
    prefetch_delay: Duration,
    shutdown: CancellationToken,
}

impl VersePipeline {
    pub fn new(catalog: Arc<VerseCatalog>, fetcher: Arc<dyn VerseFetcher>) -> Self {
        Self {
            catalog,
            fetcher,
            cache: Arc::new(PrefetchCache::new()),
            foreground: AttemptPolicy::for_kind(RunKind::Foreground),
            background: AttemptPolicy::for_kind(RunKind::Background),
            prefetch_delay: Duration::from_secs(1),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_policies(mut self, foreground: AttemptPolicy, background: AttemptPolicy) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_prefetch_delay(mut self, delay: Duration) -> Self {
        self.prefetch_delay = delay;
        self
    }

    pub fn cache(&self) -> &Arc<PrefetchCache> {
        &self.cache
    }

    pub fn policy(&self, kind: RunKind) -> AttemptPolicy {
        match kind {
            RunKind::Foreground => self.foreground,
            RunKind::Background => self.background,
        }
    }

    /// Produces exactly one outcome for `now`. Never fails: fetch problems
    /// end up as [`DisplayOutcome::NoVerseAvailable`].
    pub async fn run(&self, now: ClockTime) -> DisplayOutcome {
        let span = info_span!("verse_run", time = %now);
        async move {
            if now.is_hour_mark() {
                debug!("hour mark, nothing to fetch");
                return DisplayOutcome::HourMark { hour: now.hour };
            }

            let target = ClockTarget::from(now);
            if let Some(verse) = self.cache.take(target).await {
                info!(reference = %verse.reference_text, "prefetch hit");
                return DisplayOutcome::VerseFound(verse);
            }
            self.cache.cancel_in_flight(target).await;

            let candidates = self.candidates(target);
            if candidates.is_empty() {
                info!(chapter = target.chapter, verse = target.verse, "no eligible books");
                return DisplayOutcome::NoVerseAvailable(target);
            }

            debug!(candidates = candidates.len(), "prefetch miss, fetching");
            match self
                .resolve(target, candidates, self.foreground, &self.shutdown)
                .await
            {
                Some(verse) => {
                    info!(reference = %verse.reference_text, "verse found");
                    DisplayOutcome::VerseFound(verse)
                }
                None => {
                    info!("all attempts failed");
                    DisplayOutcome::NoVerseAvailable(target)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Tries candidates one at a time in random order until a fetch succeeds,
    /// the policy bound is reached, or `cancel` fires.
    pub async fn resolve(
        &self,
        target: ClockTarget,
        candidates: Vec<String>,
        policy: AttemptPolicy,
        cancel: &CancellationToken,
    ) -> Option<VerseResult> {
        let attempts = policy.attempts_for(candidates.len());
        for (i, book) in draw_order(candidates).take(attempts).enumerate() {
            if i > 0 && !policy.delay_between.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    _ = sleep(policy.delay_between) => {}
                }
            }
            debug!(attempt = i + 1, of = attempts, %book, "fetching");
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                v = self.fetcher.fetch(&book, target) => v,
            };
            if fetched.is_some() {
                return fetched;
            }
        }
        None
    }

    /// Runs one prefetch cycle to completion. Returns whether the slot was filled.
    pub async fn prefetch(&self, ticket: CycleTicket) -> bool {
        let target = ticket.target();
        if target.verse == 0 {
            return false;
        }
        let candidates = self.candidates(target);
        if candidates.is_empty() {
            debug!(time = %ticket.time(), "nothing to prefetch");
            return false;
        }

        match self
            .resolve(target, candidates, self.background, ticket.cancel_token())
            .await
        {
            Some(verse) => self.cache.fill(&ticket, verse).await,
            None => {
                if ticket.is_cancelled() {
                    debug!(time = %ticket.time(), "prefetch superseded");
                } else {
                    info!(time = %ticket.time(), "prefetch exhausted candidates");
                }
                false
            }
        }
    }

    /// Starts a prefetch cycle for `next` now and runs it in the background
    /// after the prefetch delay.
    pub async fn schedule_prefetch(&self, next: ClockTime) -> PrefetchHandle {
        let ticket = self.cache.begin_cycle(next).await;
        let cancel = ticket.cancel_token().clone();
        let shutdown = self.shutdown.clone();
        let pipeline = self.clone();
        let delay = self.prefetch_delay;

        let span = info_span!("prefetch", time = %next);
        let task = tokio::spawn(
            async move {
                let cycle_cancel = ticket.cancel_token().clone();
                tokio::select! {
                    _ = cycle_cancel.cancelled() => debug!("cancelled before completion"),
                    _ = shutdown.cancelled() => debug!("shutdown"),
                    _ = async {
                        sleep(delay).await;
                        pipeline.prefetch(ticket).await;
                    } => {}
                }
            }
            .instrument(span),
        );

        PrefetchHandle { next, cancel, task }
    }

    /// Cancels the foreground run and any prefetch cycle.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.cache.close().await;
    }

    fn candidates(&self, target: ClockTarget) -> Vec<String> {
        self.catalog
            .eligible_books(target)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

/// Handle to a spawned prefetch cycle.
#[derive(Debug)]
pub struct PrefetchHandle {
    next: ClockTime,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PrefetchHandle {
    pub fn next(&self) -> ClockTime {
        self.next
    }

    /// Asks the cycle to stop at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn abort(self) {
        self.cancel.cancel();
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the cycle task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "prefetch task failed");
            }
        }
    }
}

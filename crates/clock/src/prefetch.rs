//! Single-slot cache for the next minute's verse.
//!
//! Each cycle bumps a generation counter; a cycle may only write into the
//! slot while its generation is still current, so results for a superseded
//! minute are dropped.

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use verse_clock_core::{ClockTarget, ClockTime, VerseResult};

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    target: Option<ClockTarget>,
    result: Option<VerseResult>,
    cancel: CancellationToken,
}

/// Proof that a caller owns the current prefetch cycle.
#[derive(Debug, Clone)]
pub struct CycleTicket {
    generation: u64,
    time: ClockTime,
    target: ClockTarget,
    cancel: CancellationToken,
}

impl CycleTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn time(&self) -> ClockTime {
        self.time
    }

    pub fn target(&self) -> ClockTarget {
        self.target
    }

    /// Cancelled once a newer cycle begins or the cache is closed.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug, Default)]
pub struct PrefetchCache {
    slot: Mutex<Slot>,
}

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot with an empty one for `next` and cancels whatever
    /// cycle was running before.
    pub async fn begin_cycle(&self, next: ClockTime) -> CycleTicket {
        let mut slot = self.slot.lock().await;
        slot.cancel.cancel();

        let target = ClockTarget::from(next);
        slot.generation += 1;
        slot.target = Some(target);
        slot.result = None;
        slot.cancel = CancellationToken::new();
        debug!(generation = slot.generation, time = %next, "prefetch cycle started");

        CycleTicket {
            generation: slot.generation,
            time: next,
            target,
            cancel: slot.cancel.clone(),
        }
    }

    /// Stores `result` if `ticket` still owns the slot. Returns whether it was stored.
    pub async fn fill(&self, ticket: &CycleTicket, result: VerseResult) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.generation != ticket.generation || slot.target != Some(ticket.target) {
            debug!(
                stale = ticket.generation,
                current = slot.generation,
                "discarding superseded prefetch result"
            );
            return false;
        }
        debug!(reference = %result.reference_text, "prefetch slot filled");
        slot.result = Some(result);
        true
    }

    /// One-shot read: the stored verse if it was prefetched for `target`.
    pub async fn take(&self, target: ClockTarget) -> Option<VerseResult> {
        let mut slot = self.slot.lock().await;
        if slot.target != Some(target) {
            return None;
        }
        slot.result.take()
    }

    /// Stops the running cycle if it is still working on `target`.
    pub async fn cancel_in_flight(&self, target: ClockTarget) {
        let slot = self.slot.lock().await;
        if slot.target == Some(target) && slot.result.is_none() && !slot.cancel.is_cancelled() {
            debug!(generation = slot.generation, "cancelling overtaken prefetch");
            slot.cancel.cancel();
        }
    }

    /// Cancels the running cycle, if any.
    pub async fn close(&self) {
        self.slot.lock().await.cancel.cancel();
    }

    pub async fn current_target(&self) -> Option<ClockTarget> {
        self.slot.lock().await.target
    }

    /// True when a verse is waiting to be taken.
    pub async fn is_ready(&self) -> bool {
        self.slot.lock().await.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(r: &str) -> VerseResult {
        VerseResult {
            reference_text: r.into(),
            body_text: "text".into(),
            translation_label: "KJV".into(),
        }
    }

    fn at(h: u8, m: u8) -> ClockTime {
        ClockTime::new(h, m).unwrap()
    }

    #[tokio::test]
    async fn take_is_one_shot_and_target_checked() {
        let cache = PrefetchCache::new();
        let ticket = cache.begin_cycle(at(10, 5)).await;
        assert!(cache.fill(&ticket, verse("Ruth 10:5")).await);

        assert!(cache.take(ClockTarget::from(at(10, 6))).await.is_none());
        assert!(cache.is_ready().await);
        let got = cache.take(ClockTarget::from(at(10, 5))).await.unwrap();
        assert_eq!(got.reference_text, "Ruth 10:5");
        assert!(cache.take(ClockTarget::from(at(10, 5))).await.is_none());
    }

    #[tokio::test]
    async fn new_cycle_discards_stale_ticket() {
        let cache = PrefetchCache::new();
        let old = cache.begin_cycle(at(10, 5)).await;
        let new = cache.begin_cycle(at(10, 6)).await;

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert!(!cache.fill(&old, verse("Ruth 10:5")).await);
        assert_eq!(cache.current_target().await, Some(new.target()));
        assert!(!cache.is_ready().await);
    }

    #[tokio::test]
    async fn new_cycle_clears_unconsumed_result() {
        let cache = PrefetchCache::new();
        let t = cache.begin_cycle(at(10, 5)).await;
        assert!(cache.fill(&t, verse("Ruth 10:5")).await);
        cache.begin_cycle(at(10, 6)).await;
        assert!(cache.take(ClockTarget::from(at(10, 5))).await.is_none());
    }

    #[tokio::test]
    async fn cancel_in_flight_only_hits_matching_target() {
        let cache = PrefetchCache::new();
        let t = cache.begin_cycle(at(8, 30)).await;
        cache.cancel_in_flight(ClockTarget::from(at(8, 31))).await;
        assert!(!t.is_cancelled());
        cache.cancel_in_flight(t.target()).await;
        assert!(t.is_cancelled());
    }
}

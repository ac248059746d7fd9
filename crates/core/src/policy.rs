use std::time::Duration;

/// Which caller is resolving a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// The visible run for the current minute; latency matters.
    Foreground,
    /// The speculative prefetch for the next minute.
    Background,
}

/// How many candidates to try and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    /// Upper bound on fetch attempts; `None` tries every candidate.
    pub max_attempts: Option<usize>,
    /// Pause before each attempt after the first.
    pub delay_between: Duration,
}

/// Foreground attempt bound used when nothing else is configured.
pub const DEFAULT_FOREGROUND_ATTEMPTS: usize = 3;

/// Background inter-attempt delay used when nothing else is configured.
pub const DEFAULT_BACKGROUND_DELAY: Duration = Duration::from_millis(250);

impl AttemptPolicy {
    /// Bounded, no delay.
    pub fn foreground(max_attempts: usize) -> Self {
        Self {
            max_attempts: (max_attempts > 0).then_some(max_attempts),
            delay_between: Duration::ZERO,
        }
    }

    /// Exhaustive, with a pause between attempts.
    pub fn background(delay_between: Duration) -> Self {
        Self {
            max_attempts: None,
            delay_between,
        }
    }

    /// Defaults for a run kind.
    pub fn for_kind(kind: RunKind) -> Self {
        match kind {
            RunKind::Foreground => Self::foreground(DEFAULT_FOREGROUND_ATTEMPTS),
            RunKind::Background => Self::background(DEFAULT_BACKGROUND_DELAY),
        }
    }

    /// Number of fetches a run over `candidates` eligible books will make at most.
    pub fn attempts_for(&self, candidates: usize) -> usize {
        self.max_attempts.map_or(candidates, |m| m.min(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_is_bounded() {
        let p = AttemptPolicy::for_kind(RunKind::Foreground);
        assert_eq!(p.attempts_for(10), 3);
        assert_eq!(p.attempts_for(2), 2);
        assert_eq!(p.delay_between, Duration::ZERO);
    }

    #[test]
    fn background_exhausts() {
        let p = AttemptPolicy::for_kind(RunKind::Background);
        assert_eq!(p.attempts_for(40), 40);
        assert_eq!(p.attempts_for(0), 0);
    }

    #[test]
    fn zero_bound_means_unbounded() {
        assert_eq!(AttemptPolicy::foreground(0).max_attempts, None);
    }
}

use std::time::{Duration, Instant};
use storymap_core::ImageAdjustments;

/// Holds slider edits back until they stop changing for `delay`.
///
/// Time is passed in so callers (and tests) control the clock.
#[derive(Debug, Clone)]
pub struct AdjustmentDebouncer {
    delay: Duration,
    pending: Option<(ImageAdjustments, Instant)>,
}

impl AdjustmentDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new value; restarts the quiet period.
    pub fn push(&mut self, adjustments: ImageAdjustments, now: Instant) {
        self.pending = Some((adjustments, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled value once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ImageAdjustments> {
        let (_, since) = self.pending.as_ref()?;
        if now.saturating_duration_since(*since) < self.delay {
            return None;
        }
        self.pending.take().map(|(adj, _)| adj)
    }

    /// Time left until `poll` would fire, for scheduling a repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let (_, since) = self.pending.as_ref()?;
        Some(self.delay.saturating_sub(now.saturating_duration_since(*since)))
    }
}

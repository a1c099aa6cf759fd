// Coalescing deadline: every trigger pushes the deadline out again, and the
// action only runs once the deadline passes with no trigger in between.
// This is a polled deadline, not a timer task: nothing runs on its own. The
// owner's event loop calls `take_expired` with the current time once per
// frame, and `cancel` disarms a pending deadline. A stalled loop never fires.
use std::time::{Duration, Instant};

/// Delay the scratched-percentage scan waits for after the last erasure step.
pub const REVEAL_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// (Re)start the timer from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per settled burst: when `now` has reached the
    /// deadline. Disarms the timer.
    pub fn take_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(REVEAL_DEBOUNCE)
    }
}

//! Trailing-edge debounce over an external millisecond clock.

/// Restartable single-shot timer.
///
/// Every `schedule` pushes the deadline to `now + delay`; the action is due
/// once the clock reaches the latest deadline. The caller owns the clock and
/// polls with [`Debouncer::fire_if_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms, deadline: None }
    }

    /// (Re)start the timer, replacing any pending deadline.
    pub fn schedule(&mut self, now: u64) -> u64 {
        let deadline = now.saturating_add(self.delay_ms);
        self.deadline = Some(deadline);
        deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Returns true exactly once per schedule, when `now` reaches the deadline.
    pub fn fire_if_due(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

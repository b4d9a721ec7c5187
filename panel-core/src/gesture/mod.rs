//! Long-press gesture timers.
//!
//! Each button owns at most one armed deadline. Arming again replaces the
//! previous deadline, releasing disarms it, and a deadline that was disarmed
//! can never be reported as due.

use alloc::collections::BTreeMap;
use core::time::Duration;

use log::debug;

use crate::behavior::ButtonId;
use crate::time::PanelInstant;

/// How long a press must be held before the gesture fires.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(2_000);

/// Tracks armed long-press deadlines for every button.
pub struct LongPressDetector<I> {
    threshold: Duration,
    armed: BTreeMap<ButtonId, I>,
}

impl<I: PanelInstant> LongPressDetector<I> {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_threshold(LONG_PRESS_THRESHOLD)
    }

    #[must_use]
    pub const fn with_threshold(threshold: Duration) -> Self {
        Self {
            threshold,
            armed: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Arms the gesture timer for `id`, replacing any pending one.
    ///
    /// Returns the deadline at which the gesture fires.
    pub fn press_start(&mut self, id: ButtonId, now: I) -> I {
        let deadline = now + self.threshold;
        if self.armed.insert(id, deadline).is_some() {
            debug!("long press re-armed for button {id}");
        }
        deadline
    }

    /// Disarms the gesture timer for `id`. Returns `true` if one was pending.
    pub fn press_end(&mut self, id: ButtonId) -> bool {
        self.cancel(id)
    }

    /// Drops any pending timer for `id` without treating it as a release.
    pub fn cancel(&mut self, id: ButtonId) -> bool {
        self.armed.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    #[must_use]
    pub fn is_armed(&self, id: ButtonId) -> bool {
        self.armed.contains_key(&id)
    }

    #[must_use]
    pub fn deadline(&self, id: ButtonId) -> Option<I> {
        self.armed.get(&id).copied()
    }

    /// Earliest armed deadline and its button (lowest id wins ties).
    #[must_use]
    pub fn next_deadline(&self) -> Option<(I, ButtonId)> {
        self.armed
            .iter()
            .map(|(&id, &deadline)| (deadline, id))
            .min()
    }

    /// Disarms the timer of `id` if it is due at `now`, returning its deadline.
    pub fn take_due(&mut self, id: ButtonId, now: I) -> Option<I> {
        match self.armed.get(&id) {
            Some(&deadline) if deadline <= now => {
                self.armed.remove(&id);
                Some(deadline)
            }
            _ => None,
        }
    }
}

impl<I: PanelInstant> Default for LongPressDetector<I> {
    fn default() -> Self {
        Self::new()
    }
}

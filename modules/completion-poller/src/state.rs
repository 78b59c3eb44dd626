use std::time::Duration;

use crate::types::Sample;

/// Mutable state of one poll loop. Owned by the loop and dropped when it exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    /// Counter value of the current stable run. `None` until the first idle
    /// sample, so that sample always counts as a change.
    pub last_counter_value: Option<u64>,
    /// Consecutive idle samples that reported `last_counter_value`.
    pub stable_repeats: u32,
    pub elapsed: Duration,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the state. Returns the final counter once
    /// `required` consecutive idle samples agree on the same value.
    pub fn observe(&mut self, sample: &Sample, required: u32) -> Option<u64> {
        if !sample.is_idle() {
            self.stable_repeats = 0;
            return None;
        }

        if self.last_counter_value == Some(sample.counter) {
            self.stable_repeats = self.stable_repeats.saturating_add(1);
        } else {
            // A new value starts a new run with this sample as its first member.
            self.last_counter_value = Some(sample.counter);
            self.stable_repeats = 1;
        }

        (self.stable_repeats >= required).then_some(sample.counter)
    }
}

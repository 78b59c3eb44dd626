use std::time::Duration;
use typed_builder::TypedBuilder;

use crate::error::{PollError, Result};

/// Timing and stability thresholds for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct PollConfig {
    /// Upper bound on total wall-clock time.
    #[builder(default = Duration::from_secs(600))]
    pub max_wait: Duration,
    /// Delay between samples. The same cadence applies after failed samples.
    #[builder(default = Duration::from_secs(10))]
    pub poll_interval: Duration,
    /// Consecutive idle samples with an unchanged counter needed to complete.
    #[builder(default = 3)]
    pub required_stable_samples: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PollConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_wait.is_zero() {
            return Err(PollError::InvalidConfig("max_wait must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(PollError::InvalidConfig(
                "poll_interval must be positive".into(),
            ));
        }
        if self.required_stable_samples == 0 {
            return Err(PollError::InvalidConfig(
                "required_stable_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Shortest time between real completion and detection.
    pub fn min_drain_time(&self) -> Duration {
        self.poll_interval
            .saturating_mul(self.required_stable_samples.saturating_sub(1))
    }
}

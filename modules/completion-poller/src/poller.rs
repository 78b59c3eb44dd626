use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::error::Result;
use crate::source::SampleSource;
use crate::state::PollState;
use crate::types::{Outcome, PollReport};

/// Stabilizing completion poller.
///
/// Samples a [`SampleSource`] on a fixed cadence until the queue reports
/// `active == 0 && pending == 0` with the same counter value for
/// `required_stable_samples` consecutive samples, or until `max_wait` elapses.
#[derive(Debug, Clone)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    /// Validates the config up front; a bad config never starts sampling.
    pub fn new(config: PollConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until completion or timeout.
    pub async fn run<S>(&self, source: &mut S) -> PollReport
    where
        S: SampleSource + ?Sized,
    {
        let required = self.config.required_stable_samples;
        let start = Instant::now();
        let mut state = PollState::new();
        let mut samples_taken = 0u64;
        let mut failed_samples = 0u64;

        info!(
            max_wait = ?self.config.max_wait,
            poll_interval = ?self.config.poll_interval,
            required_stable_samples = required,
            "Polling for completion"
        );

        while start.elapsed() < self.config.max_wait {
            match source.sample().await {
                Ok(sample) => {
                    samples_taken += 1;
                    let done = state.observe(&sample, required);
                    state.elapsed = start.elapsed();
                    debug!(
                        active = sample.active,
                        pending = sample.pending,
                        counter = sample.counter,
                        stable_repeats = state.stable_repeats,
                        elapsed = ?state.elapsed,
                        "Sample"
                    );

                    if let Some(counter) = done {
                        info!(
                            counter,
                            samples_taken,
                            elapsed = ?state.elapsed,
                            "Queue drained and counter stable"
                        );
                        return PollReport {
                            outcome: Outcome::Completed(counter),
                            samples_taken,
                            failed_samples,
                            elapsed: state.elapsed,
                        };
                    }
                }
                Err(e) => {
                    // Inconclusive: neither advances nor resets the stable run.
                    failed_samples += 1;
                    warn!(
                        error = %e,
                        stable_repeats = state.stable_repeats,
                        "Sampling failed, will retry"
                    );
                }
            }

            sleep(self.config.poll_interval).await;
        }

        let elapsed = start.elapsed();
        warn!(
            samples_taken,
            failed_samples,
            last_counter = ?state.last_counter_value,
            elapsed = ?elapsed,
            "Timed out waiting for completion"
        );

        PollReport {
            outcome: Outcome::TimedOut,
            samples_taken,
            failed_samples,
            elapsed,
        }
    }
}

/// Wait for an asynchronous job to finish.
///
/// Returns `Err` only for a misconfigured poll. Timing out is
/// [`Outcome::TimedOut`].
pub async fn await_completion<S>(source: &mut S, config: PollConfig) -> Result<Outcome>
where
    S: SampleSource + ?Sized,
{
    let poller = Poller::new(config)?;
    Ok(poller.run(source).await.outcome)
}

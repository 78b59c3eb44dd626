use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// One observation of the job's progress proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Jobs currently executing.
    pub active: u64,
    /// Jobs waiting to be picked up.
    pub pending: u64,
    /// Completed units of work so far. Never decreases within one poll.
    pub counter: u64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(active: u64, pending: u64, counter: u64) -> Self {
        Self {
            active,
            pending,
            counter,
            timestamp: Utc::now(),
        }
    }

    /// Nothing running and nothing waiting.
    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.pending == 0
    }
}

/// How a poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Queue drained and counter stable; carries the final counter value.
    Completed(u64),
    /// The wall-clock budget ran out first.
    TimedOut,
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(counter) => write!(f, "completed(counter={counter})"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Outcome plus bookkeeping from a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: Outcome,
    /// Successful samples.
    pub samples_taken: u64,
    /// Samples that failed and were skipped.
    pub failed_samples: u64,
    pub elapsed: Duration,
}

impl fmt::Display for PollReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "outcome={} samples={} failed={} elapsed={:?}",
            self.outcome,
            self.samples_taken,
            self.failed_samples,
            self.elapsed,
        )
    }
}

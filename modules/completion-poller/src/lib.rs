//! Completion detection for asynchronous jobs that expose no completion callback.
//!
//! A job running in a separate worker fleet is observed through two proxies:
//! a queue depth (`active` + `pending`) and a monotonically non-decreasing
//! progress counter. The job is declared complete once the queue is drained
//! and the counter has held the same value across several consecutive
//! samples. Otherwise the poll gives up after a wall-clock budget.

pub mod config;
pub mod error;
pub mod poller;
pub mod source;
pub mod state;
pub mod types;

pub use config::PollConfig;
pub use error::{PollError, Result};
pub use poller::{await_completion, Poller};
pub use source::{sample_fn, FnSource, SampleSource};
pub use state::PollState;
pub use types::{Outcome, PollReport, Sample};

//! Completion watching for the Reddit → summarization → Ghost publishing pipeline.
//!
//! Each stage's workers drain a backend queue and bump a progress counter on
//! the API server's `/metrics`. A stage is done once its queue is empty and
//! the counter stops moving.

pub mod config;
pub mod error;
pub mod sampler;
pub mod stage;
pub mod types;
pub mod watcher;

pub use config::{Config, LogFormat};
pub use error::{Result, WatchError};
pub use sampler::StageSampler;
pub use stage::{Stage, StageOverrides, StageSpec};
pub use types::{PipelineSummary, StageReport, StatusReport};
pub use watcher::{default_specs, Watcher};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown stage: {0} (expected collection, processing or publishing)")]
    UnknownStage(String),

    #[error(transparent)]
    Poll(#[from] completion_poller::PollError),

    #[error(transparent)]
    Client(#[from] pipeline_client::PipelineError),
}

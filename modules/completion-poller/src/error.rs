use thiserror::Error;

pub type Result<T> = std::result::Result<T, PollError>;

/// Errors that abort a poll before it starts.
///
/// Sampling failures never show up here: they are transient and the loop
/// keeps going. Running out of time is an [`Outcome`](crate::Outcome), not
/// an error.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(String),
}

use async_trait::async_trait;
use std::future::Future;

use crate::types::Sample;

/// Produces one [`Sample`] per call. Typically performs network reads.
///
/// Errors are treated as transient: the poller logs them and tries again on
/// its normal cadence.
#[async_trait]
pub trait SampleSource: Send {
    async fn sample(&mut self) -> anyhow::Result<Sample>;
}

/// Adapts a closure returning a future into a [`SampleSource`].
pub struct FnSource<F> {
    f: F,
}

/// Wrap an async closure as a sampling capability.
pub fn sample_fn<F, Fut>(f: F) -> FnSource<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Sample>> + Send + 'static,
{
    FnSource { f }
}

#[async_trait]
impl<F, Fut> SampleSource for FnSource<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Sample>> + Send + 'static,
{
    async fn sample(&mut self) -> anyhow::Result<Sample> {
        (self.f)().await
    }
}

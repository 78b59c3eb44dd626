use anyhow::Context;
use async_trait::async_trait;
use tracing::warn;

use completion_poller::{Sample, SampleSource};
use pipeline_client::PipelineClient;

use crate::stage::StageSpec;

/// Samples one stage over HTTP: queue depth, then the progress counter.
pub struct StageSampler {
    client: PipelineClient,
    queues: Vec<String>,
    metric: String,
    last_counter: Option<u64>,
}

impl StageSampler {
    pub fn new(client: PipelineClient, spec: &StageSpec) -> Self {
        Self {
            client,
            queues: spec.queues.clone(),
            metric: spec.metric.clone(),
            last_counter: None,
        }
    }
}

#[async_trait]
impl SampleSource for StageSampler {
    async fn sample(&mut self) -> anyhow::Result<Sample> {
        let snapshot = self
            .client
            .queue_status()
            .await
            .context("fetching queue status")?;
        let depth = snapshot
            .totals(self.queues.as_slice())
            .context("summing stage queues")?;

        let counter = self
            .client
            .counter(&self.metric)
            .await
            .with_context(|| format!("reading counter {}", self.metric))?;

        if let Some(previous) = self.last_counter {
            if counter < previous {
                // Usually an API server restart resetting its in-process counters.
                warn!(
                    metric = self.metric.as_str(),
                    previous,
                    counter,
                    "Progress counter went backwards"
                );
            }
        }
        self.last_counter = Some(counter);

        Ok(Sample::new(depth.active, depth.pending, counter))
    }
}

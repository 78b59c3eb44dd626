use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use completion_poller::Poller;
use pipeline_client::{counter_value, PipelineClient};

use crate::error::Result;
use crate::sampler::StageSampler;
use crate::stage::{Stage, StageSpec};
use crate::types::{PipelineSummary, StageReport, StatusReport};

/// Waits for pipeline stages to drain, one at a time.
pub struct Watcher {
    client: PipelineClient,
}

impl Watcher {
    pub fn new(client: PipelineClient) -> Self {
        Self { client }
    }

    /// Watch a single stage. A timeout is logged and returned, not raised;
    /// only a misconfigured spec is an error.
    pub async fn watch_stage(&self, spec: &StageSpec) -> Result<StageReport> {
        let poller = Poller::new(spec.poll)?;
        let poll_id = Uuid::new_v4();
        let span = info_span!("watch_stage", stage = spec.stage.as_str(), %poll_id);

        async {
            info!(
                queues = ?spec.queues,
                metric = spec.metric.as_str(),
                "Waiting for stage to drain"
            );

            let mut sampler = StageSampler::new(self.client.clone(), spec);
            let report = poller.run(&mut sampler).await;

            if report.outcome.is_completed() {
                info!(%report, "Stage complete");
            } else {
                warn!(%report, "Stage did not settle within budget, proceeding anyway");
            }

            Ok(StageReport {
                stage: spec.stage,
                report,
            })
        }
        .instrument(span)
        .await
    }

    /// Watch stages in the given order. Every stage is watched even if an
    /// earlier one timed out.
    pub async fn watch_pipeline(&self, specs: &[StageSpec]) -> Result<PipelineSummary> {
        // Reject bad configs before spending time on earlier stages.
        for spec in specs {
            spec.poll.validate()?;
        }

        let mut summary = PipelineSummary::default();
        for spec in specs {
            let report = self.watch_stage(spec).await?;
            summary.stages.push(report);
        }

        info!(%summary, all_completed = summary.all_completed(), "Pipeline watch complete");
        Ok(summary)
    }

    /// One snapshot of all queues and each stage's counter.
    pub async fn status(&self, specs: &[StageSpec]) -> Result<StatusReport> {
        let queues = self.client.queue_status().await?;
        let metrics = self.client.metrics_text().await?;

        let counters = specs
            .iter()
            .map(|spec| {
                (
                    spec.stage,
                    spec.metric.clone(),
                    counter_value(&metrics, &spec.metric),
                )
            })
            .collect();

        Ok(StatusReport { queues, counters })
    }
}

/// Default specs for every stage, in pipeline order.
pub fn default_specs() -> Vec<StageSpec> {
    Stage::ALL.iter().map(Stage::spec).collect()
}

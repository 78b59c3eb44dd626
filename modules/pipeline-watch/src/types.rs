use std::fmt;

use completion_poller::{Outcome, PollReport};
use pipeline_client::QueueSnapshot;

use crate::stage::Stage;

/// Result of watching one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub report: PollReport,
}

impl StageReport {
    pub fn outcome(&self) -> Outcome {
        self.report.outcome
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.report)
    }
}

/// Results of watching several stages in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub stages: Vec<StageReport>,
}

impl PipelineSummary {
    pub fn all_completed(&self) -> bool {
        self.stages.iter().all(|s| s.outcome().is_completed())
    }

    pub fn timed_out(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages
            .iter()
            .filter(|s| !s.outcome().is_completed())
            .map(|s| s.stage)
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|s| format!("{}={}", s.stage, s.outcome()))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// One-shot view of queues and stage counters.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub queues: QueueSnapshot,
    /// Counter per stage; `None` when the metric is absent.
    pub counters: Vec<(Stage, String, Option<u64>)>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Queues:")?;
        if self.queues.queues.is_empty() {
            writeln!(f, "  (none reported)")?;
        }
        for (name, depth) in &self.queues.queues {
            writeln!(f, "  {name:<16} {depth}")?;
        }
        writeln!(f, "Counters:")?;
        for (stage, metric, value) in &self.counters {
            match value {
                Some(v) => writeln!(f, "  {:<12} {metric} = {v}", stage.as_str())?,
                None => writeln!(f, "  {:<12} {metric} = (missing)", stage.as_str())?,
            }
        }
        Ok(())
    }
}

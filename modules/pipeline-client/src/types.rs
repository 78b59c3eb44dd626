use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PipelineError, Result};

/// Depth of one backend task queue, as reported by `GET /api/v1/status/queues`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub scheduled: u64,
}

impl QueueDepth {
    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.pending == 0
    }
}

impl std::ops::AddAssign for QueueDepth {
    fn add_assign(&mut self, rhs: Self) {
        self.active = self.active.saturating_add(rhs.active);
        self.pending = self.pending.saturating_add(rhs.pending);
        self.scheduled = self.scheduled.saturating_add(rhs.scheduled);
    }
}

impl fmt::Display for QueueDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "active={} pending={} scheduled={}",
            self.active, self.pending, self.scheduled
        )
    }
}

/// Queue name to depth, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueSnapshot {
    pub queues: BTreeMap<String, QueueDepth>,
}

impl QueueSnapshot {
    pub fn get(&self, name: &str) -> Option<&QueueDepth> {
        self.queues.get(name)
    }

    /// Sum depths over `filter`. An empty filter means every queue.
    ///
    /// A named queue absent from the snapshot is `QueueMissing`, not zero.
    pub fn totals<S: AsRef<str>>(&self, filter: &[S]) -> Result<QueueDepth> {
        let mut total = QueueDepth::default();
        if filter.is_empty() {
            for depth in self.queues.values() {
                total += *depth;
            }
        } else {
            for name in filter {
                let name = name.as_ref();
                let depth = self
                    .queues
                    .get(name)
                    .ok_or_else(|| PipelineError::QueueMissing(name.to_string()))?;
                total += *depth;
            }
        }
        Ok(total)
    }
}

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use completion_poller::PollConfig;

use crate::error::WatchError;

/// Default wall-clock budget for any stage.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Consecutive stable samples before a stage counts as drained.
const DEFAULT_STABLE_SAMPLES: u32 = 3;

/// A pipeline stage whose worker fleet drains a backend queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reddit collection.
    Collection,
    /// AI summarization.
    Processing,
    /// Ghost publishing.
    Publishing,
}

impl Stage {
    /// Pipeline order.
    pub const ALL: [Stage; 3] = [Stage::Collection, Stage::Processing, Stage::Publishing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Processing => "processing",
            Self::Publishing => "publishing",
        }
    }

    /// Progress counter exported on `/metrics`.
    pub fn counter_metric(&self) -> &'static str {
        match self {
            Self::Collection => "posts_collected_total",
            Self::Processing => "posts_processed_total",
            Self::Publishing => "posts_published_total",
        }
    }

    /// Processing is LLM-bound, so it is sampled less often.
    pub fn poll_interval(&self) -> Duration {
        match self {
            Self::Collection | Self::Publishing => Duration::from_secs(10),
            Self::Processing => Duration::from_secs(15),
        }
    }

    /// Default watch settings for this stage.
    pub fn spec(&self) -> StageSpec {
        StageSpec {
            stage: *self,
            queues: vec![self.as_str().to_string()],
            metric: self.counter_metric().to_string(),
            poll: PollConfig::builder()
                .max_wait(DEFAULT_MAX_WAIT)
                .poll_interval(self.poll_interval())
                .required_stable_samples(DEFAULT_STABLE_SAMPLES)
                .build(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collection" | "collect" => Ok(Self::Collection),
            "processing" | "process" => Ok(Self::Processing),
            "publishing" | "publish" => Ok(Self::Publishing),
            other => Err(WatchError::UnknownStage(other.to_string())),
        }
    }
}

/// What to watch for one stage and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub stage: Stage,
    /// Queues whose depth gates completion. Empty means every queue.
    pub queues: Vec<String>,
    pub metric: String,
    pub poll: PollConfig,
}

/// Per-invocation adjustments on top of a stage's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOverrides {
    pub max_wait: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub required_stable_samples: Option<u32>,
    pub queues: Option<Vec<String>>,
    pub metric: Option<String>,
}

impl StageSpec {
    pub fn with_overrides(mut self, overrides: &StageOverrides) -> Self {
        if let Some(max_wait) = overrides.max_wait {
            self.poll.max_wait = max_wait;
        }
        if let Some(interval) = overrides.poll_interval {
            self.poll.poll_interval = interval;
        }
        if let Some(required) = overrides.required_stable_samples {
            self.poll.required_stable_samples = required;
        }
        if let Some(queues) = &overrides.queues {
            self.queues = queues.clone();
        }
        if let Some(metric) = &overrides.metric {
            self.metric = metric.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_polls_slower() {
        assert_eq!(Stage::Collection.spec().poll.poll_interval, Duration::from_secs(10));
        assert_eq!(Stage::Processing.spec().poll.poll_interval, Duration::from_secs(15));
        assert_eq!(Stage::Publishing.spec().poll.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn default_spec_watches_own_queue_and_counter() {
        let spec = Stage::Publishing.spec();
        assert_eq!(spec.queues, vec!["publishing".to_string()]);
        assert_eq!(spec.metric, "posts_published_total");
        assert_eq!(spec.poll.required_stable_samples, 3);
        assert_eq!(spec.poll.max_wait, Duration::from_secs(600));
        assert!(spec.poll.validate().is_ok());
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("collection".parse::<Stage>().unwrap(), Stage::Collection);
        assert_eq!(" Process ".parse::<Stage>().unwrap(), Stage::Processing);
        assert_eq!("publish".parse::<Stage>().unwrap(), Stage::Publishing);
        assert!(matches!(
            "ingest".parse::<Stage>(),
            Err(WatchError::UnknownStage(name)) if name == "ingest"
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for stage in Stage::ALL {
            assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let spec = Stage::Collection.spec().with_overrides(&StageOverrides {
            max_wait: Some(Duration::from_secs(60)),
            metric: Some("reddit_posts_total".into()),
            ..Default::default()
        });
        assert_eq!(spec.poll.max_wait, Duration::from_secs(60));
        assert_eq!(spec.poll.poll_interval, Duration::from_secs(10));
        assert_eq!(spec.metric, "reddit_posts_total");
        assert_eq!(spec.queues, vec!["collection".to_string()]);
    }
}

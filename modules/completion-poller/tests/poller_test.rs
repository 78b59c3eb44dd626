//! Poller behavior under virtual time. Sleeps auto-advance the paused clock,
//! so a 10 minute budget runs instantly and deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use completion_poller::{
    await_completion, sample_fn, Outcome, PollConfig, PollError, Poller, Sample, SampleSource,
};

/// Replays a fixed script, then repeats the last entry forever.
struct ScriptedSource {
    script: VecDeque<Step>,
    last: Step,
    calls: u64,
}

#[derive(Clone, Copy)]
enum Step {
    Ok(u64, u64, u64),
    Fail,
}

impl ScriptedSource {
    fn new(steps: &[Step]) -> Self {
        let last = *steps.last().expect("script must not be empty");
        Self {
            script: steps.iter().copied().collect(),
            last,
            calls: 0,
        }
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    async fn sample(&mut self) -> anyhow::Result<Sample> {
        self.calls += 1;
        match self.script.pop_front().unwrap_or(self.last) {
            Step::Ok(active, pending, counter) => Ok(Sample::new(active, pending, counter)),
            Step::Fail => anyhow::bail!("connection refused"),
        }
    }
}

fn config(max_wait_secs: u64, interval_secs: u64, required: u32) -> PollConfig {
    PollConfig::builder()
        .max_wait(Duration::from_secs(max_wait_secs))
        .poll_interval(Duration::from_secs(interval_secs))
        .required_stable_samples(required)
        .build()
}

// =========================================================================
// Completion
// =========================================================================

#[tokio::test(start_paused = true)]
async fn completes_after_fourth_sample() {
    let mut source = ScriptedSource::new(&[
        Step::Ok(2, 5, 0),
        Step::Ok(0, 0, 10),
        Step::Ok(0, 0, 10),
        Step::Ok(0, 0, 10),
    ]);
    let start = Instant::now();

    let outcome = await_completion(&mut source, config(600, 10, 3)).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(10));
    assert_eq!(source.calls, 4);
    // Three sleeps between four samples.
    assert_eq!(start.elapsed().as_secs(), 30);
}

#[tokio::test(start_paused = true)]
async fn stable_run_completes_no_later_than_threshold() {
    let mut source = ScriptedSource::new(&[Step::Ok(0, 0, 7)]);

    let report = Poller::new(config(600, 15, 3)).unwrap().run(&mut source).await;

    assert_eq!(report.outcome, Outcome::Completed(7));
    assert_eq!(report.samples_taken, 3);
    assert_eq!(report.failed_samples, 0);
    assert_eq!(report.elapsed.as_secs(), 30);
}

#[tokio::test(start_paused = true)]
async fn busy_sample_restarts_stable_run() {
    let mut source = ScriptedSource::new(&[
        Step::Ok(0, 0, 5),
        Step::Ok(0, 0, 5),
        Step::Ok(1, 0, 5),
        Step::Ok(0, 0, 5),
        Step::Ok(0, 0, 5),
        Step::Ok(0, 0, 5),
    ]);

    let outcome = await_completion(&mut source, config(600, 10, 3)).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(5));
    assert_eq!(source.calls, 6);
}

#[tokio::test(start_paused = true)]
async fn plateau_then_progress_then_plateau_reports_final_counter() {
    let mut source = ScriptedSource::new(&[
        Step::Ok(0, 0, 3),
        Step::Ok(0, 0, 3),
        Step::Ok(0, 0, 8),
        Step::Ok(0, 0, 8),
        Step::Ok(0, 0, 8),
    ]);

    let outcome = await_completion(&mut source, config(600, 10, 3)).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(8));
    assert_eq!(source.calls, 5);
}

// =========================================================================
// Timeout
// =========================================================================

#[tokio::test(start_paused = true)]
async fn busy_queue_times_out_after_budget() {
    let mut source = ScriptedSource::new(&[Step::Ok(1, 0, 0)]);
    let start = Instant::now();

    let outcome = await_completion(&mut source, config(30, 10, 3)).await.unwrap();

    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(source.calls, 3);
    assert_eq!(start.elapsed().as_secs(), 30);
}

#[tokio::test(start_paused = true)]
async fn ever_changing_counter_never_completes() {
    let counter = Arc::new(AtomicU64::new(0));
    let calls = counter.clone();
    let mut source = sample_fn(move || {
        let value = counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok(Sample::new(0, 0, value)) }
    });

    let outcome = await_completion(&mut source, config(120, 10, 3)).await.unwrap();

    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(calls.load(Ordering::SeqCst), 12);
}

#[tokio::test(start_paused = true)]
async fn interval_longer_than_budget_samples_once() {
    let mut source = ScriptedSource::new(&[Step::Ok(0, 0, 1)]);

    let report = Poller::new(config(5, 10, 3)).unwrap().run(&mut source).await;

    assert_eq!(report.outcome, Outcome::TimedOut);
    assert_eq!(report.samples_taken, 1);
}

// =========================================================================
// Transient failures
// =========================================================================

#[tokio::test(start_paused = true)]
async fn single_failure_does_not_prevent_completion() {
    let mut source = ScriptedSource::new(&[
        Step::Ok(0, 0, 5),
        Step::Ok(0, 0, 5),
        Step::Fail,
        Step::Ok(0, 0, 5),
    ]);

    let report = Poller::new(config(600, 10, 3)).unwrap().run(&mut source).await;

    assert_eq!(report.outcome, Outcome::Completed(5));
    // The failure neither resets nor advances the stable run.
    assert_eq!(report.samples_taken, 3);
    assert_eq!(report.failed_samples, 1);
    assert_eq!(source.calls, 4);
}

#[tokio::test(start_paused = true)]
async fn persistent_failures_time_out() {
    let mut source = ScriptedSource::new(&[Step::Fail]);

    let report = Poller::new(config(60, 15, 3)).unwrap().run(&mut source).await;

    assert_eq!(report.outcome, Outcome::TimedOut);
    assert_eq!(report.samples_taken, 0);
    assert_eq!(report.failed_samples, 4);
}

// =========================================================================
// Determinism and configuration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn same_script_yields_same_outcome() {
    let script = [
        Step::Ok(3, 1, 0),
        Step::Fail,
        Step::Ok(0, 0, 12),
        Step::Ok(0, 0, 12),
        Step::Ok(0, 0, 12),
    ];

    let first = await_completion(&mut ScriptedSource::new(&script), config(600, 10, 3))
        .await
        .unwrap();
    let second = await_completion(&mut ScriptedSource::new(&script), config(600, 10, 3))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, Outcome::Completed(12));
}

#[tokio::test(start_paused = true)]
async fn invalid_config_fails_before_sampling() {
    let mut source = ScriptedSource::new(&[Step::Ok(0, 0, 1)]);

    let result = await_completion(&mut source, config(600, 10, 0)).await;

    assert!(matches!(result, Err(PollError::InvalidConfig(_))));
    assert_eq!(source.calls, 0);
}

#[tokio::test(start_paused = true)]
async fn works_through_trait_object() {
    let mut source: Box<dyn SampleSource> = Box::new(ScriptedSource::new(&[Step::Ok(0, 0, 2)]));

    let outcome = await_completion(source.as_mut(), config(600, 10, 2)).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(2));
}

// =========================================================================
// Logging
// =========================================================================

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test(start_paused = true)]
async fn sub_second_timing_is_logged_precisely() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = PollConfig::builder()
        .max_wait(Duration::from_millis(250))
        .poll_interval(Duration::from_millis(50))
        .required_stable_samples(3)
        .build();
    let mut source = ScriptedSource::new(&[Step::Ok(1, 0, 0)]);

    let report = Poller::new(config).unwrap().run(&mut source).await;

    assert_eq!(report.outcome, Outcome::TimedOut);
    let text = logs.contents();
    assert!(text.contains("max_wait=250ms"), "logs: {text}");
    assert!(text.contains("poll_interval=50ms"), "logs: {text}");
}

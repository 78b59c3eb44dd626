use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeline_client::PipelineClient;
use pipeline_watch::{Config, LogFormat, Stage, StageOverrides, StageSpec, Watcher};

/// Exit code when a stage timed out under `--strict`.
const EXIT_TIMED_OUT: u8 = 2;

#[derive(Parser)]
#[command(name = "pipeline-watch")]
#[command(about = "Wait for pipeline stages to finish draining their queues")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for one stage to finish
    Wait {
        /// collection, processing or publishing
        stage: Stage,

        #[command(flatten)]
        timing: TimingArgs,

        /// Queue to watch instead of the stage default (repeatable)
        #[arg(long = "queue")]
        queues: Vec<String>,

        /// Progress counter to read from /metrics instead of the stage default
        #[arg(long)]
        metric: Option<String>,

        /// Exit non-zero if the stage times out
        #[arg(long)]
        strict: bool,
    },

    /// Wait for each stage in pipeline order
    Pipeline {
        /// Stages to watch, comma separated
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "collection,processing,publishing"
        )]
        stages: Vec<Stage>,

        #[command(flatten)]
        timing: TimingArgs,

        /// Exit non-zero if any stage times out
        #[arg(long)]
        strict: bool,
    },

    /// Print current queue depths and stage counters
    Status,
}

#[derive(Args)]
struct TimingArgs {
    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    max_wait: Option<u64>,

    /// Seconds between samples
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Consecutive stable samples required
    #[arg(long, value_name = "N")]
    stable: Option<u32>,
}

impl TimingArgs {
    fn overrides(&self) -> StageOverrides {
        StageOverrides {
            max_wait: self.max_wait.map(Duration::from_secs),
            poll_interval: self.interval.map(Duration::from_secs),
            required_stable_samples: self.stable,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_logging(config.log_format);
    config.log_redacted();

    let client = PipelineClient::new(&config.api_config())?;
    info!(api_url = client.base_url(), "Pipeline watch starting");
    let watcher = Watcher::new(client);

    match cli.command {
        Commands::Wait {
            stage,
            timing,
            queues,
            metric,
            strict,
        } => {
            let overrides = StageOverrides {
                queues: (!queues.is_empty()).then_some(queues),
                metric,
                ..timing.overrides()
            };
            let spec = stage.spec().with_overrides(&overrides);

            let report = watcher.watch_stage(&spec).await?;
            println!("{report}");
            Ok(ExitCode::from(exit_status(
                report.outcome().is_completed(),
                strict,
            )))
        }
        Commands::Pipeline {
            stages,
            timing,
            strict,
        } => {
            let overrides = timing.overrides();
            let specs: Vec<StageSpec> = stages
                .iter()
                .map(|s| s.spec().with_overrides(&overrides))
                .collect();

            let summary = watcher.watch_pipeline(&specs).await?;
            for report in &summary.stages {
                println!("{report}");
            }
            Ok(ExitCode::from(exit_status(summary.all_completed(), strict)))
        }
        Commands::Status => {
            let status = watcher.status(&pipeline_watch::default_specs()).await?;
            print!("{status}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A timeout only fails the process under `--strict`.
fn exit_status(completed: bool, strict: bool) -> u8 {
    if completed || !strict {
        0
    } else {
        EXIT_TIMED_OUT
    }
}

fn init_logging(format: LogFormat) {
    // RUST_LOG wins; e.g. RUST_LOG=completion_poller=debug shows every sample.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("pipeline_watch=info,completion_poller=info,pipeline_client=info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_fails_only_when_strict() {
        assert_eq!(exit_status(false, true), EXIT_TIMED_OUT);
        assert_eq!(exit_status(false, false), 0);
        assert_eq!(exit_status(true, true), 0);
        assert_eq!(exit_status(true, false), 0);
    }

    #[test]
    fn pipeline_parses_stage_list_and_aliases() {
        let cli = Cli::try_parse_from([
            "pipeline-watch",
            "pipeline",
            "--stages",
            "collection,publish",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Commands::Pipeline { stages, strict, .. } => {
                assert_eq!(stages, vec![Stage::Collection, Stage::Publishing]);
                assert!(strict);
            }
            _ => panic!("expected pipeline command"),
        }
    }

    #[test]
    fn pipeline_defaults_to_every_stage() {
        let cli = Cli::try_parse_from(["pipeline-watch", "pipeline"]).unwrap();

        match cli.command {
            Commands::Pipeline { stages, strict, .. } => {
                assert_eq!(stages, Stage::ALL.to_vec());
                assert!(!strict);
            }
            _ => panic!("expected pipeline command"),
        }
    }

    #[test]
    fn wait_collects_repeated_queues_and_timing() {
        let cli = Cli::try_parse_from([
            "pipeline-watch",
            "wait",
            "processing",
            "--stable",
            "5",
            "--interval",
            "2",
            "--queue",
            "a",
            "--queue",
            "b",
        ])
        .unwrap();

        match cli.command {
            Commands::Wait {
                stage,
                timing,
                queues,
                metric,
                strict,
            } => {
                assert_eq!(stage, Stage::Processing);
                assert_eq!(queues, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(metric, None);
                assert!(!strict);

                let overrides = timing.overrides();
                assert_eq!(overrides.required_stable_samples, Some(5));
                assert_eq!(overrides.poll_interval, Some(Duration::from_secs(2)));
                assert_eq!(overrides.max_wait, None);
            }
            _ => panic!("expected wait command"),
        }
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert!(Cli::try_parse_from(["pipeline-watch", "wait", "archiving"]).is_err());
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;
use epg_fetch::config::DEFAULT_CONFIG_PATH;
use epg_fetch::{FetchJob, FetchOptions, RunSummary, build_client, load_config, run_all};
use tokio::signal;

#[derive(Parser)]
#[command(
    name = "epg-fetch",
    version,
    about = "Download EPG files (pluto.xml, epg_all.xml.gz) concurrently"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// Directory relative destinations are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Replace files that already exist
    #[arg(long)]
    overwrite: bool,

    /// Only run the named job (repeatable)
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,

    /// Repeat forever on this interval, e.g. `6h` or `30m`. Implies `--overwrite`
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    every: Option<Duration>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let level = match cli.debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    let jobs = match config.resolve_jobs(&cli.only) {
        Ok(jobs) => jobs,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(2);
        }
    };
    // Later ticks must be able to replace what the first one wrote.
    let options = config.options(cli.overwrite || cli.every.is_some());
    let client = match build_client(&options) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Failed to build HTTP client: {err}");
            return ExitCode::from(2);
        }
    };

    let Some(every) = cli.every else {
        let summary = run_once(&client, &jobs, &options).await;
        return if summary.all_succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    };

    log::info!(
        "Running {} job(s) every {}",
        jobs.len(),
        humantime::format_duration(every)
    );
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_once(&client, &jobs, &options).await;
            }
            _ = signal::ctrl_c() => {
                log::info!("Received shutdown signal, stopping...");
                return ExitCode::SUCCESS;
            }
        }
    }
}

async fn run_once(
    client: &reqwest::Client,
    jobs: &[FetchJob],
    options: &FetchOptions,
) -> RunSummary {
    let started_at = Utc::now();
    let outcomes = run_all(client, jobs, options).await;
    let summary = RunSummary::from_outcomes(started_at, &outcomes);
    log::info!(
        "Run started {} finished: {} succeeded, {} failed",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.succeeded,
        summary.failed
    );
    summary
}

//! tagsweep - integrity sweeps for S3-compatible buckets
//!
//! This is the CLI application: it resolves configuration, builds the
//! storage client, runs the sweep engine, and renders its events and the
//! final report.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, StorageArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::logging::init_tracing;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tagsweep_config::Config;
use tagsweep_engine::SweepRunner;
use tagsweep_errors::ConfigError;
use tagsweep_storage::{build_client, RetryPolicy, S3ObjectStore};
use tagsweep_types::{SweepReport, Verdict};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(cli.global.debug);

    match run(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!("Application error: {}", e);
            if !json_mode {
                eprintln!("Error: {e}");
            }
            ExitCode::from(2)
        }
    }
}

/// What a completed command found; drives the process exit code so scripted
/// sweeps can branch on findings without parsing output.
enum Outcome {
    Clean,
    FindingsPresent,
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::FindingsPresent => ExitCode::from(1),
        }
    }

    fn from_report(report: &SweepReport) -> Self {
        if report.is_clean() {
            Outcome::Clean
        } else {
            Outcome::FindingsPresent
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<Outcome, CliError> {
    info!("Starting tagsweep v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file, then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;

    match cli.command {
        Commands::Sweep {
            storage,
            prefix,
            concurrency,
        } => {
            apply_storage_args(&mut config, &storage);
            if let Some(prefix) = prefix {
                config.sweep.prefix = Some(prefix);
            }
            if let Some(concurrency) = concurrency {
                config.sweep.concurrency = concurrency;
            }
            config.validate()?;

            run_sweep(&config, cli.global.json, cli.global.debug).await
        }
        Commands::Check { key, storage } => {
            apply_storage_args(&mut config, &storage);
            config.validate()?;

            run_check(&config, &key, cli.global.json).await
        }
    }
}

fn apply_storage_args(config: &mut Config, args: &StorageArgs) {
    if let Some(bucket) = &args.bucket {
        config.sweep.bucket = Some(bucket.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.storage.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = &args.region {
        config.storage.region = Some(region.clone());
    }
    if args.path_style {
        config.storage.force_path_style = true;
    }
}

async fn build_store(config: &Config) -> Arc<S3ObjectStore> {
    let client = build_client(
        config.storage.endpoint.as_deref(),
        config.storage.region.as_deref(),
        config.storage.force_path_style,
        Duration::from_secs(config.network.timeout),
    )
    .await;

    let retry = RetryPolicy::new(
        config.network.retries,
        Duration::from_millis(config.network.retry_delay_ms),
    );

    Arc::new(S3ObjectStore::new(client, retry))
}

async fn run_sweep(config: &Config, json: bool, debug: bool) -> Result<Outcome, CliError> {
    let bucket = config
        .sweep
        .bucket
        .clone()
        .ok_or(ConfigError::MissingBucket)?;

    let store = build_store(config).await;
    let (tx, mut rx) = tagsweep_events::channel();

    // Ctrl-C requests cooperative cancellation; in-flight checks finish and
    // the report comes back marked partial.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let runner = SweepRunner::builder()
        .with_store(store)
        .with_bucket(bucket)
        .with_prefix(config.sweep.prefix.clone())
        .with_concurrency(config.sweep.concurrency)
        .with_content_retry(RetryPolicy::new(
            config.network.retries,
            Duration::from_millis(config.network.retry_delay_ms),
        ))
        .with_cancellation(cancel)
        .with_event_sender(tx)
        .build()?;

    let sweep = tokio::spawn(async move { runner.run().await });

    let mut handler = EventHandler::new(debug, json);
    while let Some(event) = rx.recv().await {
        handler.handle_event(&event);
    }

    let report = sweep
        .await
        .map_err(|e| CliError::Engine(tagsweep_errors::Error::internal(e.to_string())))??;

    let renderer = OutputRenderer::new(json);
    renderer.render_report(&report)?;

    Ok(Outcome::from_report(&report))
}

async fn run_check(config: &Config, key: &str, json: bool) -> Result<Outcome, CliError> {
    let bucket = config
        .sweep
        .bucket
        .clone()
        .ok_or(ConfigError::MissingBucket)?;

    let store = build_store(config).await;
    let (tx, mut rx) = tagsweep_events::channel();

    let runner = SweepRunner::builder()
        .with_store(store)
        .with_bucket(bucket)
        .with_content_retry(RetryPolicy::new(
            config.network.retries,
            Duration::from_millis(config.network.retry_delay_ms),
        ))
        .with_event_sender(tx)
        .build()?;

    let verdict = runner.check_key(key).await;

    // Drain any diagnostics emitted during the check
    rx.close();
    while let Ok(event) = rx.try_recv() {
        crate::logging::log_event_with_tracing(&event);
    }

    let renderer = OutputRenderer::new(json);
    renderer.render_verdict(key, &verdict)?;

    match verdict {
        Verdict::Consistent | Verdict::Skipped { .. } => Ok(Outcome::Clean),
        Verdict::Mismatch { .. } | Verdict::Unreadable { .. } => Ok(Outcome::FindingsPresent),
    }
}

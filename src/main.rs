//! burst-bench - Repeated burst load-measurement harness

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use burst_bench_core::{BurstEngineBuilder, OrchestratorBuilder, ResultSink, RunObserver};
use burst_bench_http::HttpTarget;
use burst_bench_report::{JsonSink, TextArtifactSink};
use burst_bench_storage::SqlCounter;
use burst_bench_ui::ConsoleObserver;

mod cli;

use cli::{Cli, Commands, RunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Validate { config } => {
            let config = cli::load_config(Some(&config))?;
            config.validate().context("Configuration is invalid")?;
            println!("Configuration is valid");
            Ok(())
        }
        Commands::ShowConfig { config } => {
            let config = cli::load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = cli::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate().context("Configuration is invalid")?;

    tracing::info!("burst-bench starting...");

    let observer: Arc<dyn RunObserver> = Arc::new(ConsoleObserver::new(!args.no_progress));

    let target = HttpTarget::from_config(&config.target).context("Failed to create HTTP target")?;
    let engine = BurstEngineBuilder::new()
        .target(Arc::new(target))
        .max_in_flight(config.burst.max_in_flight)
        .timeout(config.burst.timeout())
        .observer(Arc::clone(&observer))
        .build()?;

    let counter = Arc::new(
        SqlCounter::connect(&config.database)
            .await
            .context("Failed to connect to the downstream database")?,
    );

    let mut sinks: Vec<Arc<dyn ResultSink>> =
        vec![Arc::new(TextArtifactSink::new(&config.output.path))];
    if let Some(json_path) = &config.output.json_path {
        sinks.push(Arc::new(JsonSink::new(json_path)));
    }

    let mut builder = OrchestratorBuilder::new()
        .config(config)
        .runner(Arc::new(engine))
        .counter(Arc::clone(&counter) as _)
        .observer(observer);
    for sink in sinks {
        builder = builder.sink(sink);
    }
    let orchestrator = builder.build()?;

    let result = orchestrator.run_with_signal_handling().await;
    counter.close().await;
    let report = result.context("Run failed")?;

    if report.cancelled {
        tracing::warn!(
            recorded = report.recorded(),
            planned = report.planned,
            "Run interrupted, partial results written"
        );
    } else if !report.skipped.is_empty() {
        tracing::warn!(
            skipped = report.skipped.len(),
            planned = report.planned,
            "Some trials were skipped"
        );
    }

    Ok(())
}

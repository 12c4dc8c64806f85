//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use burst_bench_core::HarnessConfig;

#[derive(Parser)]
#[command(name = "burst-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured trials and write the result artifact
    Run(RunArgs),
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the effective configuration as TOML
    ShowConfig {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Options for `run`; every flag overrides the configuration file
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, env = "BURST_BENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target URL
    #[arg(long)]
    pub url: Option<String>,

    /// Concurrent requests per burst
    #[arg(short = 'n', long)]
    pub requests: Option<usize>,

    /// Number of trials
    #[arg(short, long)]
    pub trials: Option<usize>,

    /// Wait between a burst and the counter read, in milliseconds
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    /// Downstream records expected per successful request
    #[arg(short, long)]
    pub multiplier: Option<u32>,

    /// Cap on concurrently running requests
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Three-line result artifact path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write every trial as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Downstream database URL (mysql:// or sqlite:)
    #[arg(long, env = "BURST_BENCH_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Table counted and cleared after each burst
    #[arg(long)]
    pub table: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, conflicts_with = "verify_tls")]
    pub insecure: bool,

    /// Verify TLS certificates
    #[arg(long)]
    pub verify_tls: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Layer the command-line flags over `config`
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(url) = &self.url {
            config.target.url = url.clone();
        }
        if self.insecure {
            config.target.skip_tls_verify = true;
        }
        if self.verify_tls {
            config.target.skip_tls_verify = false;
        }
        if let Some(requests) = self.requests {
            config.burst.requests = requests;
        }
        if let Some(max) = self.max_in_flight {
            config.burst.max_in_flight = Some(max);
        }
        if let Some(trials) = self.trials {
            config.trials.count = trials;
        }
        if let Some(delay) = self.settle_delay_ms {
            config.trials.settle_delay_ms = delay;
        }
        if let Some(multiplier) = self.multiplier {
            config.trials.multiplier = multiplier;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(table) = &self.table {
            config.database.table = table.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(json) = &self.json_output {
            config.output.json_path = Some(json.clone());
        }
    }
}

/// Load the configuration file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

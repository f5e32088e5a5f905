//! perfdash - performance artifact collector
//!
//! Walks a directory of per-build test artifacts, decodes every recognized
//! summary into a per-build time series and writes it as JSON for charting.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod collect;
mod config;
mod output;

use collect::Collector;
use config::{LogFormat, PerfdashConfig};

/// Performance artifact collector
#[derive(Parser)]
#[command(name = "perfdash")]
#[command(author, version, about = "Collects performance test artifacts into a per-build time series", long_about = None)]
pub struct Cli {
    /// Directory with one subdirectory per build number
    #[arg(long, short, env = "PERFDASH_ARTIFACTS")]
    pub artifacts: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Keep only the most recent N builds
    #[arg(long)]
    pub max_builds: Option<usize>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the report
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PerfdashConfig::load(cli.config.as_deref())?;
    init_tracing(cli.log_format.unwrap_or(config.log_format));

    info!(artifacts = %cli.artifacts.display(), "Starting perfdash");

    let collector = Collector::new(config.artifact_rules(), config.normalizer.clone());
    let mut result = collector.collect(&cli.artifacts)?;

    if let Some(max_builds) = cli.max_builds.or(config.max_builds) {
        result.retain_latest(max_builds);
    }

    output::write_report(&result, cli.output.as_deref())?;
    info!(builds = result.build_count(), "Report written");

    Ok(())
}

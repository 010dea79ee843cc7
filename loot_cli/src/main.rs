//! Loot enrichment entry point.
//!
//! Reads loot templates and data tables, writes enriched creature files, the
//! data table contents listing and the loot summary.

use anyhow::{Context, Result};
use clap::Parser;
use creature_core::{Pipeline, PipelineConfig, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Resolve creature loot templates into per-item drop chances
#[derive(Parser, Debug)]
#[command(name = "loot-enricher")]
#[command(version, long_about = None)]
struct Cli {
    /// TOML config file; defaults apply to anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the tier-partitioned data table tree
    #[arg(long)]
    data_tables: Option<PathBuf>,

    /// Directory of loot template files
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Directory of creature files
    #[arg(long)]
    creatures: Option<PathBuf>,

    /// Directory receiving all outputs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed the table cache from an existing contents listing
    #[arg(long)]
    reuse_contents: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = &self.data_tables {
            config.data_tables_dir = dir.clone();
        }
        if let Some(dir) = &self.templates {
            config.templates_dir = dir.clone();
        }
        if let Some(dir) = &self.creatures {
            config.creatures_dir = dir.clone();
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }
        config.reuse_contents |= self.reuse_contents;

        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.pipeline_config()?;
    tracing::debug!("Config: {:?}", config);

    Pipeline::new(config).run().context("enrichment run failed")
}

/// Log to stderr. `RUST_LOG` wins over the default level.
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport) {
    println!("Tables loaded:       {} ({} from disk)", report.tables_loaded, report.disk_reads);
    println!("Templates loaded:    {}", report.templates_loaded);
    println!("Creatures processed: {}", report.creatures_processed);
    println!("Creatures enriched:  {}", report.creatures_enriched);

    if !report.failures.is_empty() {
        println!("Failed files:        {}", report.failures.len());
        for path in &report.failures {
            println!("  {}", path.display());
        }
    }
}

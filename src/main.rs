use anyhow::Result;
use clap::{Parser, Subcommand};
use demoscope::config::load_config;
use demoscope::fetch::Fetcher;
use demoscope::harness::run_harness;
use demoscope::pipeline::{crawl_demographics, run_pipeline};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "demoscope", about = "Country indicator scrape/clean/merge pipeline")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long)]
    delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Crawl {
        #[arg(long, default_value_t = false)]
        no_persist: bool,
    },
    Harness,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.dirs.data_dir = dir;
    }
    if let Some(dir) = cli.cache_dir {
        config.dirs.cache_dir = dir;
    }
    if let Some(dir) = cli.out_dir {
        config.dirs.out_dir = dir;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.fetch.delay_ms = delay_ms;
    }

    match cli.command {
        Commands::Run => {
            let report = run_pipeline(&config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Crawl { no_persist } => {
            let fetcher = Fetcher::new(&config.fetch, &config.dirs.cache_dir)?;
            let rows = crawl_demographics(&fetcher, &config, !no_persist)?;
            info!(countries = rows.len(), "crawl complete");
        }
        Commands::Harness => {
            let report = run_harness(&config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

//! Write the master script and batch job files of an eyeball run.

use anyhow::{Context, Result};
use campaign::exposures::{DesDataLayout, ExposureSource};
use campaign::scripts::JobWriter;
use campaign::{load_run_explist, RunConfig, RunStore};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Write batch job scripts for an eyeball run")]
struct Args {
    #[arg(help = "Run identifier; configuration is read from {run}.yaml")]
    run: String,

    #[arg(long, help = "Commands per batch file, overriding the run config")]
    chunksize: Option<usize>,

    #[arg(long, help = "Only write commands for chips without a product")]
    missing: bool,
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let store = RunStore::from_env()?;

    let mut config = RunConfig::load(&store.config_file(&args.run))?;
    if let Some(chunksize) = args.chunksize {
        anyhow::ensure!(chunksize > 0, "--chunksize must be positive");
        config.chunksize = chunksize;
    }

    let exposures = load_run_explist(&config.run_explist)?;
    info!("{} exposures in {}", exposures.len(), config.run_explist.display());

    let layout = DesDataLayout::from_config(&config);
    let mut chips = Vec::new();
    for exposure in &exposures {
        chips.extend(
            layout
                .chips(exposure)
                .with_context(|| format!("Failed to list chips of {}", exposure.expname))?,
        );
    }

    let writer = JobWriter::new(store, &args.run, config);
    writer.write_master()?;
    let summary = writer.write_batches(&chips, args.missing)?;
    info!(
        "{} commands, {} batches, {} already done",
        summary.ncommands, summary.nchunks, summary.nskipped
    );
    Ok(())
}

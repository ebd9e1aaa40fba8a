//! Build the sqlite index of the products of an eyeball run.

use anyhow::Result;
use campaign::index_db::{IndexDb, FILES_INDEX_FIELDS, QA_INDEX_FIELDS};
use campaign::{load_run_explist, RunConfig, RunStore};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Make the sqlite index of an eyeball run")]
struct Args {
    #[arg(help = "Run identifier; configuration is read from {run}.yaml")]
    run: String,
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let store = RunStore::from_env()?;
    let config = RunConfig::load(&store.config_file(&args.run))?;
    let exposures = load_run_explist(&config.run_explist)?;

    let mut db = IndexDb::create(&store.db_file(&args.run))?;
    let summary = db.populate(&store, &args.run, &exposures, &config)?;
    db.add_indices("files", &FILES_INDEX_FIELDS)?;
    db.add_indices("qa", &QA_INDEX_FIELDS)?;

    info!(
        "indexed {} products in {} ({} missing)",
        summary.inserted,
        db.path().display(),
        summary.missing
    );
    Ok(())
}

//! Write a tone-mapped quick-look preview of one background-subtracted CCD.

use anyhow::{Context, Result};
use clap::Parser;
use eyeball::container::SectionReader;
use eyeball::exposure::Exposure;
use eyeball::image_proc::io::write_field_preview;
use eyeball::io::fits::FitsReader;
use eyeball::product::EyeballPaths;
use eyeball::EyeballConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Make a JPEG preview of a CCD image")]
struct Args {
    #[arg(help = "Reduced image with sci, msk and wgt sections")]
    image: PathBuf,

    #[arg(help = "Background model")]
    bkg: PathBuf,

    #[arg(help = "Output JPEG (or PNG by extension)")]
    output: PathBuf,

    #[arg(long, default_value = "4", help = "Rebin factor; 1 keeps full resolution")]
    rebin: usize,
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    EyeballPaths::new(&args.image, &args.bkg, &args.output).check_inputs()?;

    let config = EyeballConfig::default();
    let mut image = FitsReader::open(&args.image)?;
    let mut bkg = FitsReader::open(&args.bkg)?;
    let exposure = Exposure::load(&mut image, &mut bkg, &config.sections)
        .with_context(|| format!("Failed to load {}", image.source()))?;

    let stretch = config.stretch.with_exptime(exposure.exptime);
    write_field_preview(exposure.science.view(), args.rebin, &stretch, &args.output)?;
    info!("wrote {}", args.output.display());
    Ok(())
}

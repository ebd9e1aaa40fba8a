//! Build the eyeball product of one CCD exposure.
//!
//! Reads a reduced image (science, mask and weight sections) and its
//! background model, writes the rebinned field and combined mask, and with
//! `--cat` adds a mosaic of cutouts around bright catalog stars.

use anyhow::{Context, Result};
use clap::Parser;
use eyeball::product::{run_eyeball, EyeballPaths};
use eyeball::EyeballConfig;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Make a rebinned field, bad pixel mask and cutout mosaic for one CCD"
)]
struct Args {
    #[arg(help = "Reduced image with sci, msk and wgt sections")]
    image: PathBuf,

    #[arg(help = "Background model")]
    bkg: PathBuf,

    #[arg(help = "Output FITS file")]
    output: PathBuf,

    #[arg(long, help = "Source catalog; enables the cutout mosaic")]
    cat: Option<PathBuf>,

    #[arg(long, help = "YAML configuration file; flags below override it")]
    config: Option<PathBuf>,

    #[arg(short = 's', long, help = "Cutout size in pixels [default: 32]")]
    size: Option<usize>,

    #[arg(short = 'n', long, help = "Maximum number of cutouts [default: 100]")]
    ncutout: Option<usize>,

    #[arg(long, help = "Rebin factor of the field and mask [default: 4]")]
    rebin: Option<usize>,

    #[arg(long, help = "Enlargement factor of the mosaic preview [default: 2]")]
    boost: Option<usize>,

    #[arg(long, value_name = "PATH", help = "Write a mosaic preview (JPEG, or PNG by extension)")]
    mosaic_jpg: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Write a field preview rebinned by 2")]
    field_jpg2: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Write a field preview rebinned by 4")]
    field_jpg4: Option<PathBuf>,
}

impl Args {
    fn eyeball_config(&self) -> Result<EyeballConfig> {
        let mut config = match &self.config {
            Some(path) => EyeballConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EyeballConfig::default(),
        };
        if let Some(size) = self.size {
            config.cutout_size = size;
        }
        if let Some(ncutout) = self.ncutout {
            config.ncutout = ncutout;
        }
        if let Some(rebin) = self.rebin {
            config.rebin = rebin;
        }
        if let Some(boost) = self.boost {
            config.boost = boost;
        }
        config.validate()?;
        Ok(config)
    }

    fn paths(&self) -> EyeballPaths {
        EyeballPaths {
            image: self.image.clone(),
            bkg: self.bkg.clone(),
            cat: self.cat.clone(),
            output: self.output.clone(),
            mosaic_preview: self.mosaic_jpg.clone(),
            field_preview2: self.field_jpg2.clone(),
            field_preview4: self.field_jpg4.clone(),
        }
    }
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let paths = args.paths();

    let config = args.eyeball_config()?;
    debug!("config: {}", serde_json::to_string(&config)?);

    let product = run_eyeball(&paths, &config)
        .with_context(|| format!("Failed to make eyeball product for {}", paths.image.display()))?;

    info!(
        "wrote {} (field {:?}, {} cutouts)",
        paths.output.display(),
        product.field.dim(),
        product.centers.as_ref().map_or(0, Vec::len)
    );
    Ok(())
}

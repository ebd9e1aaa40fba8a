//! Per-run configuration and exposure lists.

use eyeball::EyeballConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CampaignError, Result};

pub const DEFAULT_NCCD: u32 = 62;
pub const DEFAULT_CHUNKSIZE: usize = 300;

/// Chips excluded from DECam processing
pub const DEFAULT_SKIP_CCDS: [u32; 3] = [2, 31, 61];

fn default_skip_ccds() -> Vec<u32> {
    DEFAULT_SKIP_CCDS.to_vec()
}

fn default_nccd() -> u32 {
    DEFAULT_NCCD
}

fn default_chunksize() -> usize {
    DEFAULT_CHUNKSIZE
}

fn default_command() -> String {
    "make-se-eyeball".to_string()
}

fn default_project() -> String {
    "OPS".to_string()
}

fn default_tmpdir() -> PathBuf {
    std::env::temp_dir()
}

/// Contents of `{run}.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Three-column file listing `run expname band` per exposure
    pub run_explist: PathBuf,
    /// Root of the reduced data tree
    pub desdata: PathBuf,
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_skip_ccds")]
    pub skip_ccds: Vec<u32>,
    #[serde(default = "default_nccd")]
    pub nccd: u32,
    /// Commands per batch file
    #[serde(default = "default_chunksize")]
    pub chunksize: usize,
    /// Eyeball product command run by the master script
    #[serde(default = "default_command")]
    pub command: String,
    /// Scratch directory for products in progress
    #[serde(default = "default_tmpdir")]
    pub tmpdir: PathBuf,
    /// Script sourced by jobs before running, if any
    #[serde(default)]
    pub setup_script: Option<PathBuf>,
    /// Pass each chip's catalog to the eyeball command so products carry a
    /// cutout mosaic; off makes field-only products
    #[serde(default)]
    pub cutouts: bool,
    #[serde(default)]
    pub eyeball: EyeballConfig,
}

impl RunConfig {
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| CampaignError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("reading run config {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| CampaignError::io(path, e))?;
        Self::from_yaml_str(&text, path)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |detail: String| CampaignError::Config {
            path: path.to_path_buf(),
            detail,
        };
        if self.chunksize == 0 {
            return Err(invalid("chunksize must be >= 1".into()));
        }
        if self.nccd == 0 {
            return Err(invalid("nccd must be >= 1".into()));
        }
        self.eyeball
            .validate()
            .map_err(|e| invalid(e.to_string()))
    }

    /// Chip numbers to process, `1..=nccd` without the skipped ones.
    pub fn ccds(&self) -> Vec<u32> {
        (1..=self.nccd)
            .filter(|ccd| !self.skip_ccds.contains(ccd))
            .collect()
    }
}

/// One line of the exposure list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunExposure {
    /// Reduction run holding the exposure
    pub run: String,
    pub expname: String,
    pub band: String,
}

/// Parse an exposure list, one `run expname band` triple per line.
///
/// Blank lines and lines starting with `#` are skipped; extra columns are
/// ignored.
pub fn parse_run_explist(text: &str, path: &Path) -> Result<Vec<RunExposure>> {
    let mut exposures = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(run), Some(expname), Some(band)) => exposures.push(RunExposure {
                run: run.to_string(),
                expname: expname.to_string(),
                band: band.to_string(),
            }),
            _ => {
                return Err(CampaignError::ExposureList {
                    path: path.to_path_buf(),
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(exposures)
}

pub fn load_run_explist(path: &Path) -> Result<Vec<RunExposure>> {
    info!("loading run, exposure list from {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|e| CampaignError::io(path, e))?;
    parse_run_explist(&text, path)
}

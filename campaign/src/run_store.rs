//! Directory layout of eyeball production runs.
//!
//! Outputs live under a data root (`$EYEBALLER_DATADIR`), one directory per
//! run; run configuration files live in the package share directory
//! (`$EYEBALLER_DIR/share/eyeball-config`).

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CampaignError, Result};

pub const DATA_DIR_ENV: &str = "EYEBALLER_DATADIR";
pub const PACKAGE_DIR_ENV: &str = "EYEBALLER_DIR";

/// Path conventions for run outputs, job scripts and databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStore {
    /// Root of all run directories
    data_dir: PathBuf,
    /// Directory holding `{run}.yaml` configuration files
    config_dir: PathBuf,
}

impl RunStore {
    pub fn new(data_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Locate the data and config directories from the environment.
    pub fn from_env() -> Result<Self> {
        let data_dir =
            std::env::var(DATA_DIR_ENV).map_err(|_| CampaignError::MissingEnv(DATA_DIR_ENV))?;
        let package_dir = std::env::var(PACKAGE_DIR_ENV)
            .map_err(|_| CampaignError::MissingEnv(PACKAGE_DIR_ENV))?;
        let config_dir = PathBuf::from(package_dir)
            .join("share")
            .join("eyeball-config");
        Ok(Self::new(data_dir, config_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self, run: &str) -> PathBuf {
        self.config_dir.join(format!("{run}.yaml"))
    }

    pub fn run_dir(&self, run: &str) -> PathBuf {
        self.data_dir.join(run)
    }

    pub fn script_dir(&self, run: &str) -> PathBuf {
        self.run_dir(run).join("scripts")
    }

    /// Wrapper script shared by all jobs of a run
    pub fn master_file(&self, run: &str) -> PathBuf {
        self.script_dir(run).join("master.sh")
    }

    /// Batch of command lines number `num`
    pub fn command_file(&self, run: &str, num: usize, missing: bool) -> PathBuf {
        let name = if missing {
            format!("commands-missing-{num:06}.sh")
        } else {
            format!("commands-{num:06}.sh")
        };
        self.script_dir(run).join(name)
    }

    /// Job queue submit file for batch `num`
    pub fn submit_file(&self, run: &str, num: usize, missing: bool) -> PathBuf {
        let name = if missing {
            format!("sub-missing-{num:06}.yaml")
        } else {
            format!("sub-{num:06}.yaml")
        };
        self.script_dir(run).join(name)
    }

    pub fn output_dir(&self, run: &str, expname: &str) -> PathBuf {
        self.run_dir(run).join(expname)
    }

    /// Eyeball product of one chip
    pub fn output_file(&self, run: &str, expname: &str, ccd: u32) -> PathBuf {
        self.output_dir(run, expname)
            .join(format!("{run}_{expname}_{ccd:02}_field.fits"))
    }

    pub fn db_dir(&self, run: &str) -> PathBuf {
        self.run_dir(run).join("db")
    }

    pub fn db_file(&self, run: &str) -> PathBuf {
        self.db_dir(run).join(format!("{run}.db"))
    }
}

/// Create a directory and its parents.
///
/// Jobs of one run create the same directories concurrently, so a directory
/// that appears between the check and the create is not an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    debug!("making directory {}", path.display());
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(CampaignError::io(path, e)),
    }
}

//! Batch job scripts for a production run.
//!
//! A run is processed by many independent jobs. Each job runs a batch of
//! command lines, and each command line runs the shared master script on one
//! chip. The master script skips chips whose product already exists and
//! moves finished products into place only after the eyeball command
//! succeeded, so an interrupted run can simply be resubmitted with
//! `missing_only`.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CampaignError, Result};
use crate::exposures::ChipFiles;
use crate::run_config::RunConfig;
use crate::run_store::{ensure_dir, RunStore};

/// Job queue scheduling mode for batch jobs
pub const WQ_MODE: &str = "bycore1";

/// Name of the eyeball configuration written next to the master script.
pub const EYEBALL_CONFIG_NAME: &str = "eyeball.yaml";

/// Text of the master script for `config`.
///
/// Arguments are `image bkg cat field_fits`. `config_path` is passed to the
/// eyeball command with `--config`. The catalog is only handed on when the
/// run makes cutouts; otherwise the product is field-only.
pub fn master_script(config: &RunConfig, config_path: &Path) -> String {
    let cat_arg = if config.cutouts { "--cat ${cat} " } else { "" };
    let mut text = String::from("#!/bin/bash\n\n");
    if let Some(setup) = &config.setup_script {
        let _ = writeln!(text, "# jobs start with an empty environment");
        let _ = writeln!(text, "source {}\n", setup.display());
    }

    let _ = write!(
        text,
        r#"image="$1"
bkg="$2"
cat="$3"
field_fits="$4"

if [[ -e $field_fits ]]; then
    echo "file exists, skipping"
    exit 0
fi

bname=$(basename $field_fits)
dname=$(dirname $field_fits)

mkdir -p ${{dname}}
mkdir -p {tmpdir}
tmpname={tmpdir}/${{bname}}

{command} --config {config_path} {cat_arg}${{image}} ${{bkg}} ${{tmpname}}
exit_status=$?

if [[ -e ${{tmpname}} ]]; then
    mv -v ${{tmpname}} ${{field_fits}}
else
    echo "file is missing: ${{tmpname}}"
fi

exit $exit_status
"#,
        tmpdir = config.tmpdir.display(),
        command = config.command,
        config_path = config_path.display(),
    );
    text
}

/// Job queue submit descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WqJob {
    pub command: String,
    pub job_name: String,
    pub mode: String,
}

/// Counts reported by [`JobWriter::write_batches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub ncommands: usize,
    pub nchunks: usize,
    /// Chips left out because their product already exists
    pub nskipped: usize,
}

/// Writes the master script and batch files of one run.
#[derive(Debug, Clone)]
pub struct JobWriter {
    store: RunStore,
    run: String,
    config: RunConfig,
}

impl JobWriter {
    pub fn new(store: RunStore, run: &str, config: RunConfig) -> Self {
        Self {
            store,
            run: run.to_string(),
            config,
        }
    }

    fn eyeball_config_file(&self) -> PathBuf {
        self.store.script_dir(&self.run).join(EYEBALL_CONFIG_NAME)
    }

    /// Write the executable master script and the eyeball configuration it
    /// passes to each job.
    pub fn write_master(&self) -> Result<PathBuf> {
        ensure_dir(&self.store.script_dir(&self.run))?;

        let config_path = self.eyeball_config_file();
        let yaml = serde_yaml::to_string(&self.config.eyeball).map_err(|e| {
            CampaignError::Config {
                path: config_path.clone(),
                detail: e.to_string(),
            }
        })?;
        write_file(&config_path, &yaml)?;

        let path = self.store.master_file(&self.run);
        info!("writing master: {}", path.display());
        write_file(&path, &master_script(&self.config, &config_path))?;
        set_executable(&path)?;
        Ok(path)
    }

    /// Command line that makes the product of one chip.
    pub fn command_line(&self, chip: &ChipFiles) -> String {
        let output = self.store.output_file(&self.run, &chip.expname, chip.ccd);
        format!(
            "{} {} {} {} {}",
            self.store.master_file(&self.run).display(),
            chip.image.display(),
            chip.bkg.display(),
            chip.cat.display(),
            output.display()
        )
    }

    /// Write command batches of at most `chunksize` lines with one submit
    /// file each.
    ///
    /// With `missing_only`, chips whose product exists are skipped and the
    /// `-missing` file names are used.
    pub fn write_batches(&self, chips: &[ChipFiles], missing_only: bool) -> Result<BatchSummary> {
        ensure_dir(&self.store.script_dir(&self.run))?;

        let mut summary = BatchSummary::default();
        let mut commands = Vec::with_capacity(chips.len());
        for chip in chips {
            let output = self.store.output_file(&self.run, &chip.expname, chip.ccd);
            if missing_only && output.exists() {
                summary.nskipped += 1;
                continue;
            }
            commands.push(self.command_line(chip));
        }
        summary.ncommands = commands.len();

        for (num, chunk) in commands.chunks(self.config.chunksize).enumerate() {
            let command_file = self.store.command_file(&self.run, num, missing_only);
            let mut text = chunk.join("\n");
            text.push('\n');
            write_file(&command_file, &text)?;

            let job = WqJob {
                command: format!("bash {}\n", command_file.display()),
                job_name: job_name(&self.run, num, missing_only),
                mode: WQ_MODE.to_string(),
            };
            let submit_file = self.store.submit_file(&self.run, num, missing_only);
            let yaml = serde_yaml::to_string(&job).map_err(|e| CampaignError::Config {
                path: submit_file.clone(),
                detail: e.to_string(),
            })?;
            write_file(&submit_file, &yaml)?;
            summary.nchunks += 1;
        }

        info!(
            "wrote {} commands in {} batches ({} skipped)",
            summary.ncommands, summary.nchunks, summary.nskipped
        );
        Ok(summary)
    }
}

fn job_name(run: &str, num: usize, missing: bool) -> String {
    if missing {
        format!("{run}-missing-{num:06}")
    } else {
        format!("{run}-{num:06}")
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| CampaignError::io(path, e))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| CampaignError::io(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

//! Discovery of the chip files that make up each exposure.
//!
//! The reduced data tree is the metadata store for a run: each exposure is a
//! directory of per-chip images with background and catalog siblings.
//! [`ExposureSource`] hides how the list of chips is obtained so that script
//! generation can be driven from other catalogs of files.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::run_config::{RunConfig, RunExposure};

/// Input files of one chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipFiles {
    pub run: String,
    pub expname: String,
    pub band: String,
    pub ccd: u32,
    pub image: PathBuf,
    pub bkg: PathBuf,
    pub cat: PathBuf,
}

impl ChipFiles {
    /// `{expname}_{ccd:02}`, the chip name used in the index database
    pub fn ccdname(&self) -> String {
        format!("{}_{:02}", self.expname, self.ccd)
    }
}

/// Provides the chips of an exposure.
pub trait ExposureSource {
    /// Chips with all inputs available; unavailable chips are left out.
    fn chips(&self, exposure: &RunExposure) -> Result<Vec<ChipFiles>>;
}

/// Chips laid out as `{desdata}/{project}/red/{run}/red/{expname}/{expname}_{ccd:02}.fits.fz`.
#[derive(Debug, Clone)]
pub struct DesDataLayout {
    desdata: PathBuf,
    project: String,
    ccds: Vec<u32>,
    require_cat: bool,
}

impl DesDataLayout {
    pub fn new(desdata: impl Into<PathBuf>, project: &str, ccds: Vec<u32>) -> Self {
        Self {
            desdata: desdata.into(),
            project: project.to_string(),
            ccds,
            require_cat: false,
        }
    }

    /// Also leave out chips without a source catalog.
    pub fn require_catalogs(mut self, require: bool) -> Self {
        self.require_cat = require;
        self
    }

    /// Layout of a run; catalogs are required when the run makes cutouts.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(&config.desdata, &config.project, config.ccds()).require_catalogs(config.cutouts)
    }

    /// Inputs a chip must have to be processed.
    fn required<'a>(&self, files: &'a ChipFiles) -> Vec<&'a PathBuf> {
        let mut required = vec![&files.image, &files.bkg];
        if self.require_cat {
            required.push(&files.cat);
        }
        required
    }

    /// Reduced image of one chip.
    pub fn image_path(&self, run: &str, expname: &str, ccd: u32) -> PathBuf {
        self.desdata
            .join(&self.project)
            .join("red")
            .join(run)
            .join("red")
            .join(expname)
            .join(format!("{expname}_{ccd:02}.fits.fz"))
    }

    pub fn chip_files(&self, exposure: &RunExposure, ccd: u32) -> ChipFiles {
        let image = self.image_path(&exposure.run, &exposure.expname, ccd);
        let bkg = sibling(&image, "_bkg.fits.fz");
        let cat = sibling(&image, "_cat.fits");
        ChipFiles {
            run: exposure.run.clone(),
            expname: exposure.expname.clone(),
            band: exposure.band.clone(),
            ccd,
            image,
            bkg,
            cat,
        }
    }
}

/// Replace the `.fits.fz` suffix of `image` with `suffix`.
fn sibling(image: &Path, suffix: &str) -> PathBuf {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".fits.fz").unwrap_or(&name);
    image.with_file_name(format!("{stem}{suffix}"))
}

impl ExposureSource for DesDataLayout {
    fn chips(&self, exposure: &RunExposure) -> Result<Vec<ChipFiles>> {
        let mut chips = Vec::with_capacity(self.ccds.len());
        for &ccd in &self.ccds {
            let files = self.chip_files(exposure, ccd);
            let missing = self.required(&files).into_iter().find(|p| !p.exists());
            match missing {
                Some(path) => warn!(
                    "run {} exposure {} ccd {:02}: missing {}",
                    exposure.run,
                    exposure.expname,
                    ccd,
                    path.display()
                ),
                None => chips.push(files),
            }
        }
        Ok(chips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exposure() -> RunExposure {
        RunExposure {
            run: "20130906_r1234p01".into(),
            expname: "DECam_00229650".into(),
            band: "r".into(),
        }
    }

    #[test]
    fn test_chip_paths() {
        let layout = DesDataLayout::new("/des", "OPS", vec![1]);
        let files = layout.chip_files(&exposure(), 3);

        assert_eq!(
            files.image,
            PathBuf::from("/des/OPS/red/20130906_r1234p01/red/DECam_00229650/DECam_00229650_03.fits.fz")
        );
        assert_eq!(
            files.bkg.file_name().unwrap(),
            "DECam_00229650_03_bkg.fits.fz"
        );
        assert_eq!(files.cat.file_name().unwrap(), "DECam_00229650_03_cat.fits");
        assert_eq!(files.ccdname(), "DECam_00229650_03");
    }

    #[test]
    fn test_missing_chips_are_omitted() {
        let dir = TempDir::new().unwrap();
        let layout = DesDataLayout::new(dir.path(), "OPS", vec![1, 3, 4]);
        let exposure = exposure();

        // ccd 1 complete, ccd 3 lacks its background, ccd 4 absent
        for file in [
            layout.chip_files(&exposure, 1).image,
            layout.chip_files(&exposure, 1).bkg,
            layout.chip_files(&exposure, 3).image,
        ] {
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(&file, b"").unwrap();
        }

        let chips = layout.chips(&exposure).unwrap();
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].ccd, 1);
    }

    #[test]
    fn test_missing_catalog_omitted_when_required() {
        let dir = TempDir::new().unwrap();
        let layout = DesDataLayout::new(dir.path(), "OPS", vec![1, 3]);
        let exposure = exposure();

        // both chips have image and background, only ccd 3 has a catalog
        let ccd1 = layout.chip_files(&exposure, 1);
        let ccd3 = layout.chip_files(&exposure, 3);
        for file in [&ccd1.image, &ccd1.bkg, &ccd3.image, &ccd3.bkg, &ccd3.cat] {
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, b"").unwrap();
        }

        let field_only = layout.chips(&exposure).unwrap();
        assert_eq!(field_only.len(), 2);

        let with_cutouts = layout.require_catalogs(true).chips(&exposure).unwrap();
        assert_eq!(with_cutouts.len(), 1);
        assert_eq!(with_cutouts[0].ccd, 3);
    }

    #[test]
    fn test_layout_from_config_requires_catalogs_for_cutouts() {
        let dir = TempDir::new().unwrap();
        let text = format!(
            "run_explist: /runs/se001.txt\ndesdata: {}\nnccd: 1\ncutouts: true\n",
            dir.path().display()
        );
        let config = RunConfig::from_yaml_str(&text, Path::new("se001.yaml")).unwrap();
        let layout = DesDataLayout::from_config(&config);
        let files = layout.chip_files(&exposure(), 1);
        for file in [&files.image, &files.bkg] {
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, b"").unwrap();
        }

        assert!(layout.chips(&exposure()).unwrap().is_empty());
        std::fs::write(&files.cat, b"").unwrap();
        assert_eq!(layout.chips(&exposure()).unwrap().len(), 1);
    }
}

//! Eyeball products: rebinned field, rebinned combined mask and an optional
//! mosaic of bright-star cutouts, bundled with the metadata needed to trace
//! them back to their inputs.
//!
//! The flow is linear: [`Exposure::load`], [`EyeballBuilder::build`],
//! [`EyeballProduct::write`]. [`run_eyeball`] chains the three over FITS
//! files and optionally writes quick-look previews.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::EyeballConfig;
use crate::container::{ColumnData, SectionReader, SectionWriter, Table};
use crate::error::{EyeballError, Result};
use crate::exposure::Exposure;
use crate::image_proc::cutout::{extract_fixed, Center};
use crate::image_proc::io::{write_field_preview, write_mosaic_preview};
use crate::image_proc::mosaic::assemble;
use crate::image_proc::rebin::{rebin_mean, rebin_or};
use crate::image_proc::stretch::{from_display_orientation, to_display_orientation};
use crate::io::fits::{FitsReader, FitsWriter};
use crate::selection::{choose_subset, seed_from_filename, select, Catalog};
use crate::{ImagePlane, MaskPlane};

pub const METADATA_SECTION: &str = "metadata";
pub const CENTERS_SECTION: &str = "centers";
pub const MOSAIC_SECTION: &str = "mosaic";
pub const FIELD_SECTION: &str = "field";
pub const BPM_SECTION: &str = "bpm_and_weight";

/// Inputs and parameters a product was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub image_file: String,
    pub bkg_file: String,
    pub cat_file: Option<String>,
    pub rebin: usize,
    pub cutout_size: usize,
    pub ncutout: usize,
    pub low_weight: Option<f32>,
}

impl ProductMetadata {
    pub fn new(
        image_file: &str,
        bkg_file: &str,
        cat_file: Option<&str>,
        config: &EyeballConfig,
    ) -> Self {
        Self {
            image_file: image_file.to_string(),
            bkg_file: bkg_file.to_string(),
            cat_file: cat_file.map(str::to_string),
            rebin: config.rebin,
            cutout_size: config.cutout_size,
            ncutout: config.ncutout,
            low_weight: config.low_weight,
        }
    }

    fn to_table(&self) -> Result<Table> {
        let text = |s: &str| ColumnData::Str(vec![s.to_string()]);
        let int = |v: usize| ColumnData::I32(vec![v as i32]);
        Table::new()
            .with_column("image_file", text(&self.image_file))?
            .with_column("bkg_file", text(&self.bkg_file))?
            .with_column("cat_file", text(self.cat_file.as_deref().unwrap_or("")))?
            .with_column("rebin", int(self.rebin))?
            .with_column("cutout_size", int(self.cutout_size))?
            .with_column("ncutout", int(self.ncutout))?
            .with_column(
                "low_weight",
                ColumnData::F64(vec![self.low_weight.map_or(f64::NAN, f64::from)]),
            )
    }

    fn read<R: SectionReader>(reader: &mut R) -> Result<Self> {
        let source = reader.source();
        let first_string = |values: Vec<String>, column: &str| {
            values.into_iter().next().ok_or_else(|| {
                EyeballError::source_read(&source, format!("empty metadata column '{column}'"))
            })
        };
        let first_int = |values: Vec<i32>, column: &str| {
            let value = values.first().copied().ok_or_else(|| {
                EyeballError::source_read(&source, format!("empty metadata column '{column}'"))
            })?;
            usize::try_from(value).map_err(|_| {
                EyeballError::source_read(
                    &source,
                    format!("negative value {value} in metadata column '{column}'"),
                )
            })
        };

        let image_file = first_string(
            reader.read_column_string(METADATA_SECTION, "image_file")?,
            "image_file",
        )?;
        let bkg_file = first_string(
            reader.read_column_string(METADATA_SECTION, "bkg_file")?,
            "bkg_file",
        )?;
        let cat_file = first_string(
            reader.read_column_string(METADATA_SECTION, "cat_file")?,
            "cat_file",
        )?;
        let rebin = first_int(reader.read_column_i32(METADATA_SECTION, "rebin")?, "rebin")?;
        let cutout_size = first_int(
            reader.read_column_i32(METADATA_SECTION, "cutout_size")?,
            "cutout_size",
        )?;
        let ncutout = first_int(
            reader.read_column_i32(METADATA_SECTION, "ncutout")?,
            "ncutout",
        )?;
        let low_weight = reader
            .read_column_f64(METADATA_SECTION, "low_weight")?
            .first()
            .copied()
            .filter(|v| !v.is_nan())
            .map(|v| v as f32);

        Ok(Self {
            image_file,
            bkg_file,
            cat_file: Some(cat_file).filter(|s| !s.is_empty()),
            rebin,
            cutout_size,
            ncutout,
            low_weight,
        })
    }
}

/// A catalog entry chosen for the mosaic, in full-resolution pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedCenter {
    /// Row of the entry in the source catalog
    pub index: usize,
    pub center: Center,
}

/// Everything written to one eyeball output file.
///
/// Planes are held in storage orientation; the display flip is applied on
/// write and undone on read.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeballProduct {
    pub metadata: ProductMetadata,
    pub centers: Option<Vec<SelectedCenter>>,
    pub mosaic: Option<ImagePlane>,
    pub field: ImagePlane,
    pub bpm_and_weight: MaskPlane,
}

impl EyeballProduct {
    /// Write all sections. The caller finishes the writer.
    pub fn write<W: SectionWriter>(&self, writer: &mut W) -> Result<()> {
        writer.write_table(METADATA_SECTION, &self.metadata.to_table()?)?;

        if let Some(centers) = &self.centers {
            let table = Table::new()
                .with_column(
                    "index",
                    ColumnData::I32(centers.iter().map(|c| c.index as i32).collect()),
                )?
                .with_column(
                    "row",
                    ColumnData::F64(centers.iter().map(|c| c.center.row).collect()),
                )?
                .with_column(
                    "col",
                    ColumnData::F64(centers.iter().map(|c| c.center.col).collect()),
                )?;
            writer.write_table(CENTERS_SECTION, &table)?;
        }

        if let Some(mosaic) = &self.mosaic {
            writer.write_image_f32(MOSAIC_SECTION, &to_display_orientation(mosaic.view()))?;
        }

        writer.write_image_f32(FIELD_SECTION, &to_display_orientation(self.field.view()))?;
        writer.write_image_i32(
            BPM_SECTION,
            &to_display_orientation(self.bpm_and_weight.view()),
        )?;
        Ok(())
    }

    /// Read a product written by [`write`](Self::write).
    pub fn read<R: SectionReader>(reader: &mut R) -> Result<Self> {
        let metadata = ProductMetadata::read(reader)?;

        let centers = if reader.has_section(CENTERS_SECTION) {
            let index = reader.read_column_i32(CENTERS_SECTION, "index")?;
            let row = reader.read_column_f64(CENTERS_SECTION, "row")?;
            let col = reader.read_column_f64(CENTERS_SECTION, "col")?;
            let source = reader.source();
            let centers = index
                .into_iter()
                .zip(row)
                .zip(col)
                .map(|((index, row), col)| {
                    let index = usize::try_from(index).map_err(|_| {
                        EyeballError::source_read(
                            &source,
                            format!("negative catalog index {index} in '{CENTERS_SECTION}'"),
                        )
                    })?;
                    Ok(SelectedCenter {
                        index,
                        center: Center::new(row, col),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(centers)
        } else {
            None
        };

        let mosaic = if reader.has_section(MOSAIC_SECTION) {
            let stored = reader.read_image_f32(MOSAIC_SECTION)?;
            Some(from_display_orientation(stored.view()))
        } else {
            None
        };

        let field = reader.read_image_f32(FIELD_SECTION)?;
        let bpm = reader.read_image_i32(BPM_SECTION)?;

        Ok(Self {
            metadata,
            centers,
            mosaic,
            field: from_display_orientation(field.view()),
            bpm_and_weight: from_display_orientation(bpm.view()),
        })
    }
}

/// Builds [`EyeballProduct`]s from loaded exposures.
#[derive(Debug, Clone)]
pub struct EyeballBuilder {
    config: EyeballConfig,
}

impl EyeballBuilder {
    pub fn new(config: EyeballConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EyeballConfig {
        &self.config
    }

    /// Select, cut out and tile catalog objects (when a catalog is given),
    /// then flag and rebin the field and mask.
    ///
    /// # Errors
    /// * `NoCandidates` if a catalog is given but no entry passes selection
    /// * `CenterOutOfBounds` if a chosen cutout would be clamped
    /// * `InvalidShape` if the exposure is not divisible by the rebin factor
    pub fn build<R: Rng + ?Sized>(
        &self,
        exposure: &Exposure,
        catalog: Option<&Catalog>,
        metadata: ProductMetadata,
        rng: &mut R,
    ) -> Result<EyeballProduct> {
        let config = &self.config;

        let (centers, mosaic) = match catalog {
            Some(catalog) => {
                let (centers, mosaic) = self.build_mosaic(exposure, catalog, rng)?;
                (Some(centers), Some(mosaic))
            }
            None => (None, None),
        };

        let mask = exposure.flagged_mask(config.low_weight);
        let (field, bpm_and_weight) = if config.rebin > 1 {
            (
                rebin_mean(exposure.science.view(), config.rebin)?,
                rebin_or(mask.view(), config.rebin)?,
            )
        } else {
            (exposure.science.clone(), mask)
        };
        debug!(
            "field {:?} -> {:?} at rebin {}",
            exposure.shape(),
            field.dim(),
            config.rebin
        );

        Ok(EyeballProduct {
            metadata,
            centers,
            mosaic,
            field,
            bpm_and_weight,
        })
    }

    fn build_mosaic<R: Rng + ?Sized>(
        &self,
        exposure: &Exposure,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<(Vec<SelectedCenter>, ImagePlane)> {
        let config = &self.config;
        let candidates = select(
            catalog,
            exposure.shape(),
            config.cutout_size,
            &config.selection,
        );
        if candidates.is_empty() {
            return Err(EyeballError::NoCandidates);
        }

        let chosen = choose_subset(&candidates, config.ncutout, rng);
        info!(
            "cutting {} of {} candidates from {} catalog entries",
            chosen.len(),
            candidates.len(),
            catalog.len()
        );

        let mut centers = Vec::with_capacity(chosen.len());
        let mut cutouts = Vec::with_capacity(chosen.len());
        for index in chosen {
            let center = catalog.entries[index].center();
            let cutout = extract_fixed(exposure.science.view(), center, config.cutout_size)?;
            cutouts.push(cutout.image);
            centers.push(SelectedCenter { index, center });
        }

        let mosaic = assemble(&cutouts, config.cutout_size)?;
        Ok((centers, mosaic))
    }
}

/// Input and output locations of one eyeball run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EyeballPaths {
    pub image: PathBuf,
    pub bkg: PathBuf,
    pub cat: Option<PathBuf>,
    pub output: PathBuf,
    pub mosaic_preview: Option<PathBuf>,
    pub field_preview2: Option<PathBuf>,
    pub field_preview4: Option<PathBuf>,
}

impl EyeballPaths {
    pub fn new(
        image: impl Into<PathBuf>,
        bkg: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            image: image.into(),
            bkg: bkg.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    /// Fail on the first input that does not exist.
    pub fn check_inputs(&self) -> Result<()> {
        let inputs = [Some(&self.image), Some(&self.bkg), self.cat.as_ref()];
        for path in inputs.into_iter().flatten() {
            if !path.exists() {
                return Err(EyeballError::source_read(path, "file does not exist"));
            }
        }
        Ok(())
    }
}

/// Seed of the cutout subset, from the image file name.
pub fn selection_seed(image: &Path) -> u64 {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    seed_from_filename(&name)
}

/// Load the inputs, build the product, write it, then write any previews.
///
/// Nothing is written if loading or building fails.
pub fn run_eyeball(paths: &EyeballPaths, config: &EyeballConfig) -> Result<EyeballProduct> {
    config.validate()?;
    paths.check_inputs()?;

    let mut image = FitsReader::open(&paths.image)?;
    let mut bkg = FitsReader::open(&paths.bkg)?;
    let exposure = Exposure::load(&mut image, &mut bkg, &config.sections)?;

    let catalog = match &paths.cat {
        Some(cat) => {
            let mut reader = FitsReader::open(cat)?;
            Some(Catalog::read(&mut reader, &config.catalog)?)
        }
        None => None,
    };

    let to_str = |p: &Path| p.display().to_string();
    let metadata = ProductMetadata::new(
        &to_str(&paths.image),
        &to_str(&paths.bkg),
        paths.cat.as_deref().map(to_str).as_deref(),
        config,
    );

    let mut rng = StdRng::seed_from_u64(selection_seed(&paths.image));
    let product = EyeballBuilder::new(config.clone()).build(
        &exposure,
        catalog.as_ref(),
        metadata,
        &mut rng,
    )?;

    info!("writing {}", paths.output.display());
    let mut writer = FitsWriter::create(&paths.output)?;
    product.write(&mut writer)?;

    // the product is committed last: a failed preview drops the writer
    let stretch = config.stretch.with_exptime(exposure.exptime);
    if let (Some(path), Some(mosaic)) = (&paths.mosaic_preview, &product.mosaic) {
        write_mosaic_preview(mosaic.view(), config.boost, &stretch, path)?;
    }
    if let Some(path) = &paths.field_preview2 {
        write_field_preview(exposure.science.view(), 2, &stretch, path)?;
    }
    if let Some(path) = &paths.field_preview4 {
        write_field_preview(exposure.science.view(), 4, &stretch, path)?;
    }

    writer.finish()?;
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::mask_bits::{BADPIX_SUSPECT, WEIGHT_FLAG};
    use crate::selection::CatalogEntry;
    use approx::assert_relative_eq;
    use ndarray::{s, Array2};
    use tempfile::TempDir;

    fn hot_block_exposure() -> Exposure {
        let mut science = Array2::<f32>::zeros((64, 64));
        science.slice_mut(s![30..35, 30..35]).fill(100.0);

        let mut weight = Array2::<f32>::ones((64, 64));
        weight[[0, 0]] = 1.0e-6;
        weight[[63, 10]] = 0.0;

        let mut mask = Array2::<i32>::zeros((64, 64));
        mask[[40, 41]] = BADPIX_SUSPECT;

        Exposure {
            science,
            mask,
            weight,
            background: Array2::zeros((64, 64)),
            exptime: 90.0,
        }
    }

    fn bright_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry {
                row: 32.0,
                col: 32.0,
                mag: 12.0,
                flags: 0,
            },
            CatalogEntry {
                row: 32.0,
                col: 32.0,
                mag: 18.0,
                flags: 0,
            },
        ])
    }

    fn small_cutout_config() -> EyeballConfig {
        let mut config = EyeballConfig {
            cutout_size: 16,
            ..Default::default()
        };
        config.selection.padding = 4;
        config
    }

    fn metadata(config: &EyeballConfig) -> ProductMetadata {
        ProductMetadata::new("image.fits", "bkg.fits", Some("cat.fits"), config)
    }

    #[test]
    fn test_end_to_end_hot_block() {
        let config = small_cutout_config();
        let exposure = hot_block_exposure();
        let catalog = bright_catalog();
        let mut rng = StdRng::seed_from_u64(7);

        let product = EyeballBuilder::new(config.clone())
            .build(&exposure, Some(&catalog), metadata(&config), &mut rng)
            .unwrap();

        assert_eq!(product.field.dim(), (16, 16));
        assert_eq!(product.bpm_and_weight.dim(), (16, 16));

        // rows 30..35: two fall in block 7, three in block 8
        assert_relative_eq!(product.field[[7, 7]], 100.0 * 4.0 / 16.0);
        assert_relative_eq!(product.field[[7, 8]], 100.0 * 6.0 / 16.0);
        assert_relative_eq!(product.field[[8, 8]], 100.0 * 9.0 / 16.0);
        assert_relative_eq!(product.field[[0, 0]], 0.0);
        let total: f32 = product.field.sum() * 16.0;
        assert_relative_eq!(total, 2500.0, epsilon = 1e-3);

        assert_eq!(product.bpm_and_weight[[0, 0]], WEIGHT_FLAG);
        assert_eq!(product.bpm_and_weight[[15, 2]], WEIGHT_FLAG);
        assert_eq!(product.bpm_and_weight[[10, 10]], BADPIX_SUSPECT);
        assert_eq!(
            product.bpm_and_weight.iter().filter(|&&v| v != 0).count(),
            3
        );

        let centers = product.centers.as_ref().unwrap();
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].index, 0);
        let mosaic = product.mosaic.as_ref().unwrap();
        assert_eq!(mosaic.dim(), (16, 16));
        // window starts at floor(32 - 7.5) = 24, hot block at local 6..11
        assert_relative_eq!(mosaic[[6, 6]], 100.0);
        assert_relative_eq!(mosaic[[5, 5]], 0.0);
    }

    #[test]
    fn test_no_candidates() {
        let config = small_cutout_config();
        let catalog = Catalog::new(vec![CatalogEntry {
            row: 2.0,
            col: 2.0,
            mag: 12.0,
            flags: 0,
        }]);
        let mut rng = StdRng::seed_from_u64(0);

        let result = EyeballBuilder::new(config.clone()).build(
            &hot_block_exposure(),
            Some(&catalog),
            metadata(&config),
            &mut rng,
        );
        assert!(matches!(result, Err(EyeballError::NoCandidates)));
    }

    #[test]
    fn test_full_resolution_without_catalog() {
        let config = EyeballConfig {
            rebin: 1,
            low_weight: None,
            ..Default::default()
        };
        let exposure = hot_block_exposure();
        let mut rng = StdRng::seed_from_u64(0);

        let product = EyeballBuilder::new(config.clone())
            .build(&exposure, None, metadata(&config), &mut rng)
            .unwrap();

        assert_eq!(product.field, exposure.science);
        assert_eq!(product.bpm_and_weight, exposure.mask);
        assert!(product.centers.is_none());
        assert!(product.mosaic.is_none());
    }

    #[test]
    fn test_rebin_must_divide_shape() {
        let config = EyeballConfig {
            rebin: 5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let result = EyeballBuilder::new(config.clone()).build(
            &hot_block_exposure(),
            None,
            metadata(&config),
            &mut rng,
        );
        assert!(matches!(result, Err(EyeballError::InvalidShape { .. })));
    }

    #[test]
    fn test_memory_round_trip() {
        let config = small_cutout_config();
        let mut rng = StdRng::seed_from_u64(3);
        let product = EyeballBuilder::new(config.clone())
            .build(
                &hot_block_exposure(),
                Some(&bright_catalog()),
                metadata(&config),
                &mut rng,
            )
            .unwrap();

        let mut container = MemoryContainer::new("product");
        {
            let mut writer = &mut container;
            product.write(&mut writer).unwrap();
            writer.finish().unwrap();
        }

        // stored in display orientation
        let stored = container.read_image_f32(FIELD_SECTION).unwrap();
        assert_eq!(stored, to_display_orientation(product.field.view()));

        let read = EyeballProduct::read(&mut container).unwrap();
        assert_eq!(read, product);
    }

    /// Image and background FITS files for [`hot_block_exposure`] in `dir`.
    fn write_exposure_files(dir: &Path) {
        let exposure = hot_block_exposure();
        let mut image = FitsWriter::create(dir.join("DECam_00229650_01.fits")).unwrap();
        image.write_image_f32("sci", &(&exposure.science + 5.0)).unwrap();
        image.write_image_i32("msk", &exposure.mask).unwrap();
        image.write_image_f32("wgt", &exposure.weight).unwrap();
        image.finish().unwrap();

        let mut bkg = FitsWriter::create(dir.join("bkg.fits")).unwrap();
        bkg.write_image_f32("sci", &Array2::from_elem((64, 64), 5.0))
            .unwrap();
        bkg.finish().unwrap();
    }

    #[test]
    fn test_fits_round_trip_and_previews() {
        let dir = TempDir::new().unwrap();
        write_exposure_files(dir.path());

        let mut cat = FitsWriter::create(dir.path().join("cat.fits")).unwrap();
        let table = Table::new()
            .with_column("YWIN_IMAGE", ColumnData::F64(vec![32.0]))
            .unwrap()
            .with_column("XWIN_IMAGE", ColumnData::F64(vec![32.0]))
            .unwrap()
            .with_column("MAG_AUTO", ColumnData::F64(vec![12.0]))
            .unwrap()
            .with_column("FLAGS", ColumnData::I32(vec![0]))
            .unwrap();
        cat.write_table("LDAC_OBJECTS", &table).unwrap();
        cat.finish().unwrap();

        let paths = EyeballPaths {
            cat: Some(dir.path().join("cat.fits")),
            mosaic_preview: Some(dir.path().join("jpg/mosaic.jpg")),
            field_preview4: Some(dir.path().join("jpg/field4.png")),
            ..EyeballPaths::new(
                dir.path().join("DECam_00229650_01.fits"),
                dir.path().join("bkg.fits"),
                dir.path().join("out/product.fits"),
            )
        };

        let product = run_eyeball(&paths, &small_cutout_config()).unwrap();
        assert!(dir.path().join("jpg/mosaic.jpg").exists());
        assert!(dir.path().join("jpg/field4.png").exists());

        let mut reader = FitsReader::open(&paths.output).unwrap();
        let read = EyeballProduct::read(&mut reader).unwrap();
        assert_eq!(read.metadata, product.metadata);
        assert_eq!(read.bpm_and_weight, product.bpm_and_weight);
        assert_eq!(read.field, product.field);
        assert_eq!(read.centers, product.centers);
        assert_eq!(read.mosaic, product.mosaic);
        assert_relative_eq!(product.field[[7, 7]], 25.0, epsilon = 1e-4);
    }

    #[test]
    fn test_failed_preview_leaves_no_product() {
        let dir = TempDir::new().unwrap();
        write_exposure_files(dir.path());
        // a plain file where the preview directory should go
        std::fs::write(dir.path().join("jpg"), b"").unwrap();

        let paths = EyeballPaths {
            field_preview2: Some(dir.path().join("jpg/field2.png")),
            ..EyeballPaths::new(
                dir.path().join("DECam_00229650_01.fits"),
                dir.path().join("bkg.fits"),
                dir.path().join("out/product.fits"),
            )
        };

        let err = run_eyeball(&paths, &EyeballConfig::default()).unwrap_err();
        assert!(matches!(err, EyeballError::OutputWrite { .. }));
        assert!(!paths.output.exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_negative_stored_values_are_rejected() {
        let config = small_cutout_config();
        let mut rng = StdRng::seed_from_u64(3);
        let product = EyeballBuilder::new(config.clone())
            .build(
                &hot_block_exposure(),
                Some(&bright_catalog()),
                metadata(&config),
                &mut rng,
            )
            .unwrap();

        let mut bad_rebin = MemoryContainer::new("bad_rebin");
        {
            let mut writer = &mut bad_rebin;
            product.write(&mut writer).unwrap();
            let text = |v: &str| ColumnData::Str(vec![v.to_string()]);
            let table = Table::new()
                .with_column("image_file", text("image.fits"))
                .unwrap()
                .with_column("bkg_file", text("bkg.fits"))
                .unwrap()
                .with_column("cat_file", text(""))
                .unwrap()
                .with_column("rebin", ColumnData::I32(vec![-4]))
                .unwrap()
                .with_column("cutout_size", ColumnData::I32(vec![16]))
                .unwrap()
                .with_column("ncutout", ColumnData::I32(vec![100]))
                .unwrap()
                .with_column("low_weight", ColumnData::F64(vec![f64::NAN]))
                .unwrap();
            writer.write_table(METADATA_SECTION, &table).unwrap();
        }
        let err = EyeballProduct::read(&mut bad_rebin).unwrap_err();
        assert!(matches!(err, EyeballError::SourceRead { .. }));
        assert!(err.to_string().contains("rebin"));

        let mut bad_index = MemoryContainer::new("bad_index");
        {
            let mut writer = &mut bad_index;
            product.write(&mut writer).unwrap();
            let table = Table::new()
                .with_column("index", ColumnData::I32(vec![-1]))
                .unwrap()
                .with_column("row", ColumnData::F64(vec![32.0]))
                .unwrap()
                .with_column("col", ColumnData::F64(vec![32.0]))
                .unwrap();
            writer.write_table(CENTERS_SECTION, &table).unwrap();
        }
        let err = EyeballProduct::read(&mut bad_index).unwrap_err();
        assert!(matches!(err, EyeballError::SourceRead { .. }));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let paths = EyeballPaths::new(
            dir.path().join("missing.fits"),
            dir.path().join("bkg.fits"),
            dir.path().join("out.fits"),
        );

        match run_eyeball(&paths, &EyeballConfig::default()) {
            Err(EyeballError::SourceRead { path, .. }) => {
                assert_eq!(path, dir.path().join("missing.fits"));
            }
            other => panic!("expected SourceRead, got {other:?}"),
        }
        assert!(!paths.output.exists());
    }

    #[test]
    fn test_selection_seed_uses_file_name() {
        assert_eq!(
            selection_seed(Path::new("/a/b/DECam_01.fits")),
            selection_seed(Path::new("/other/DECam_01.fits"))
        );
        assert_eq!(selection_seed(Path::new("/data/ab")), 9798);
    }
}

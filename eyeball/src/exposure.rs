//! Loading of one CCD exposure and its background model.

use ndarray::Zip;
use tracing::{debug, info, warn};

use crate::config::SectionNames;
use crate::container::SectionReader;
use crate::error::{EyeballError, Result};
use crate::image_proc::stretch::NOMINAL_EXPTIME;
use crate::mask_bits::{count_flagged, flag_low_weight, BADPIX_SUSPECT, WEIGHT_FLAG};
use crate::{ImagePlane, MaskPlane};

/// Header keyword holding the exposure time in seconds.
pub const EXPTIME_KEY: &str = "EXPTIME";

/// Background-subtracted science plane with its mask and weight.
///
/// All four planes share one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub science: ImagePlane,
    pub mask: MaskPlane,
    pub weight: ImagePlane,
    pub background: ImagePlane,
    pub exptime: f64,
}

impl Exposure {
    /// Read science, mask and weight from `image` and the background from
    /// `bkg`, then subtract the background from the science plane.
    ///
    /// # Errors
    /// `SourceRead` if a section is missing or the shapes disagree.
    pub fn load<I, B>(image: &mut I, bkg: &mut B, sections: &SectionNames) -> Result<Self>
    where
        I: SectionReader,
        B: SectionReader,
    {
        info!("loading {} and {}", image.source(), bkg.source());

        let mut science = image.read_image_f32(&sections.image)?;
        let mask = image.read_image_i32(&sections.mask)?;
        let weight = image.read_image_f32(&sections.weight)?;
        let background = bkg.read_image_f32(&sections.background)?;

        let shape = science.dim();
        let check = |source: String, section: &str, dim: (usize, usize)| {
            if dim == shape {
                Ok(())
            } else {
                Err(EyeballError::source_read(
                    source,
                    format!("section '{section}' has shape {dim:?}, expected {shape:?}"),
                ))
            }
        };
        check(image.source(), &sections.mask, mask.dim())?;
        check(image.source(), &sections.weight, weight.dim())?;
        check(bkg.source(), &sections.background, background.dim())?;

        Zip::from(&mut science)
            .and(&background)
            .for_each(|s, &b| *s -= b);

        let exptime = match image.read_key_f64(&sections.image, EXPTIME_KEY) {
            Some(t) if t > 0.0 => t,
            Some(t) => {
                warn!("ignoring non-positive {EXPTIME_KEY} {t} in {}", image.source());
                NOMINAL_EXPTIME
            }
            None => NOMINAL_EXPTIME,
        };
        debug!(
            "exposure shape {:?}, exptime {}, {} suspect pixels",
            shape,
            exptime,
            count_flagged(mask.view(), BADPIX_SUSPECT)
        );

        Ok(Self {
            science,
            mask,
            weight,
            background,
            exptime,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.science.dim()
    }

    /// Mask with the low-weight bit added where `weight < low_weight`.
    ///
    /// `None` returns the mask unchanged.
    pub fn flagged_mask(&self, low_weight: Option<f32>) -> MaskPlane {
        match low_weight {
            Some(threshold) => {
                let (flagged, count) =
                    flag_low_weight(self.mask.view(), self.weight.view(), threshold);
                debug!(
                    "{count} pixels below weight {threshold}, {} low-weight pixels in total",
                    count_flagged(flagged.view(), WEIGHT_FLAG)
                );
                flagged
            }
            None => self.mask.clone(),
        }
    }
}

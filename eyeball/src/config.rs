//! Configuration for eyeball product generation.
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes. The same structure is embedded in campaign run files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EyeballError, Result};
use crate::image_proc::stretch::StretchParams;
use crate::mask_bits::WEIGHT_LOWVAL_SVY1;

pub const DEFAULT_REBIN: usize = 4;
pub const DEFAULT_CUTOUT_SIZE: usize = 32;
pub const DEFAULT_NCUTOUT: usize = 100;
pub const DEFAULT_MOSAIC_BOOST: usize = 2;

/// Catalog objects usable as cutout centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Exclusive lower magnitude bound (uncalibrated instrumental magnitudes)
    pub min_mag: f64,
    /// Exclusive upper magnitude bound
    pub max_mag: f64,
    /// Extra clearance from the image edge beyond half the cutout size
    pub padding: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_mag: 10.0,
            max_mag: 15.0,
            padding: 10,
        }
    }
}

/// Section names of the input image and background files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionNames {
    pub image: String,
    pub mask: String,
    pub weight: String,
    pub background: String,
}

impl Default for SectionNames {
    fn default() -> Self {
        Self {
            image: "sci".to_string(),
            mask: "msk".to_string(),
            weight: "wgt".to_string(),
            background: "sci".to_string(),
        }
    }
}

/// Where the source catalog keeps its objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub section: String,
    pub row: String,
    pub col: String,
    pub mag: String,
    pub flags: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            section: "LDAC_OBJECTS".to_string(),
            row: "YWIN_IMAGE".to_string(),
            col: "XWIN_IMAGE".to_string(),
            mag: "MAG_AUTO".to_string(),
            flags: "FLAGS".to_string(),
        }
    }
}

/// All tunables of one eyeball product run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeballConfig {
    /// Integer reduction factor for the field and mask; `<= 1` keeps full resolution
    pub rebin: usize,
    /// Weight below which pixels get the low-weight mask bit; `None` disables
    pub low_weight: Option<f32>,
    pub cutout_size: usize,
    /// Maximum number of cutouts in the mosaic
    pub ncutout: usize,
    /// Enlargement factor of the mosaic preview
    pub boost: usize,
    pub selection: SelectionConfig,
    pub sections: SectionNames,
    pub catalog: CatalogColumns,
    pub stretch: StretchParams,
}

impl Default for EyeballConfig {
    fn default() -> Self {
        Self {
            rebin: DEFAULT_REBIN,
            low_weight: Some(WEIGHT_LOWVAL_SVY1),
            cutout_size: DEFAULT_CUTOUT_SIZE,
            ncutout: DEFAULT_NCUTOUT,
            boost: DEFAULT_MOSAIC_BOOST,
            selection: SelectionConfig::default(),
            sections: SectionNames::default(),
            catalog: CatalogColumns::default(),
            stretch: StretchParams::default(),
        }
    }
}

impl EyeballConfig {
    /// Load a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EyeballError::source_read(path, e))?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|e| EyeballError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rebin == 0 {
            return Err(EyeballError::InvalidConfig("rebin must be >= 1".into()));
        }
        if self.cutout_size == 0 {
            return Err(EyeballError::InvalidConfig("cutout_size must be >= 1".into()));
        }
        if self.boost == 0 {
            return Err(EyeballError::InvalidConfig("boost must be >= 1".into()));
        }
        let (min_mag, max_mag) = (self.selection.min_mag, self.selection.max_mag);
        if min_mag.is_nan() || max_mag.is_nan() || min_mag >= max_mag {
            return Err(EyeballError::InvalidConfig(format!(
                "empty magnitude range ({min_mag}, {max_mag})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EyeballConfig::default();
        assert_eq!(config.rebin, 4);
        assert_eq!(config.cutout_size, 32);
        assert_eq!(config.ncutout, 100);
        assert_eq!(config.low_weight, Some(1.0e-4));
        assert_eq!(config.sections.mask, "msk");
        assert_eq!(config.catalog.row, "YWIN_IMAGE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "rebin: 2\nselection:\n  max_mag: 16.5\nlow_weight: null\n";
        let config: EyeballConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.rebin, 2);
        assert_eq!(config.selection.max_mag, 16.5);
        assert_eq!(config.selection.min_mag, 10.0);
        assert_eq!(config.selection.padding, 10);
        assert_eq!(config.low_weight, None);
        assert_eq!(config.cutout_size, 32);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EyeballConfig {
            rebin: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = EyeballConfig::default();
        config.selection.min_mag = 15.0;
        config.selection.max_mag = 15.0;
        assert!(config.validate().is_err());
    }
}

//! Tone mapping of background-subtracted images for quick-look previews.
//!
//! An asinh stretch compresses the bright end while keeping faint sky
//! structure visible. The default scale and nonlinearity are tuned for an
//! r-band 90 second exposure; other exposure times are normalized by
//! `nominal_exptime / exptime`.

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Exposure time the default scale was tuned for, in seconds
pub const NOMINAL_EXPTIME: f64 = 90.0;
pub const DEFAULT_SCALE: f64 = 0.004;
pub const DEFAULT_NONLINEAR: f64 = 0.16;

/// Parameters of the asinh stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchParams {
    /// Exposure time of the image being stretched, seconds
    pub exptime: f64,
    pub scale: f64,
    pub nonlinear: f64,
    pub nominal_exptime: f64,
}

impl Default for StretchParams {
    fn default() -> Self {
        Self {
            exptime: NOMINAL_EXPTIME,
            scale: DEFAULT_SCALE,
            nonlinear: DEFAULT_NONLINEAR,
            nominal_exptime: NOMINAL_EXPTIME,
        }
    }
}

impl StretchParams {
    /// Same parameters for an image with a different exposure time.
    pub fn with_exptime(self, exptime: f64) -> Self {
        Self { exptime, ..self }
    }

    /// Linear scale applied before the asinh, normalized to the exposure time.
    pub fn effective_scale(&self) -> f64 {
        if self.exptime > 0.0 {
            self.scale * self.nominal_exptime / self.exptime
        } else {
            self.scale
        }
    }
}

/// Apply `asinh(x * scale * nonlinear) / nonlinear` to every pixel.
pub fn asinh_stretch(image: ArrayView2<f32>, params: &StretchParams) -> Array2<f32> {
    let scale = params.effective_scale();
    let nonlinear = params.nonlinear;
    image.mapv(|v| ((v as f64 * scale * nonlinear).asinh() / nonlinear) as f32)
}

/// Map `[0, 1]` to `[0, 255]`, clipping values outside the range.
pub fn bytescale(image: ArrayView2<f32>) -> Array2<u8> {
    image.mapv(|v| {
        if v.is_nan() {
            0
        } else {
            (v.clamp(0.0, 1.0) * 255.0) as u8
        }
    })
}

/// Flip vertically then transpose.
///
/// For DES CCD images this puts north up and east to the left when the
/// result is displayed with its origin in the upper left.
pub fn to_display_orientation<T: Clone>(image: ArrayView2<T>) -> Array2<T> {
    image.slice(s![..;-1, ..]).t().to_owned()
}

/// Inverse of [`to_display_orientation`].
pub fn from_display_orientation<T: Clone>(image: ArrayView2<T>) -> Array2<T> {
    image.t().slice(s![..;-1, ..]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_asinh_stretch_values() {
        let image = array![[0.0f32, 100.0], [-100.0, 1000.0]];
        let params = StretchParams::default();
        let out = asinh_stretch(image.view(), &params);

        assert_eq!(out[[0, 0]], 0.0);
        let expected = (100.0f64 * 0.004 * 0.16).asinh() / 0.16;
        assert_relative_eq!(out[[0, 1]] as f64, expected, epsilon = 1e-6);
        assert_relative_eq!(out[[1, 0]], -out[[0, 1]]);
        assert!(out[[1, 1]] > out[[0, 1]]);
    }

    #[test]
    fn test_exptime_normalization() {
        let image = array![[200.0f32]];
        let long = StretchParams::default().with_exptime(180.0);
        let short = StretchParams::default();

        let half_flux = array![[100.0f32]];
        assert_relative_eq!(
            asinh_stretch(image.view(), &long)[[0, 0]],
            asinh_stretch(half_flux.view(), &short)[[0, 0]],
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_bytescale_clips() {
        let image = array![[-0.5f32, 0.0, 0.5, 1.0, 7.0, f32::NAN]];
        let bytes = bytescale(image.view());
        assert_eq!(bytes, array![[0u8, 0, 127, 255, 255, 0]]);
    }

    #[test]
    fn test_display_orientation() {
        let image = array![[1, 2, 3], [4, 5, 6]];
        let display = to_display_orientation(image.view());

        // flipud -> [[4,5,6],[1,2,3]], transpose -> 3 x 2
        assert_eq!(display, array![[4, 1], [5, 2], [6, 3]]);
        assert_eq!(from_display_orientation(display.view()), image);
    }
}

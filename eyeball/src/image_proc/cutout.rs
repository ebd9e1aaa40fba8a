//! Bounded sub-image extraction around catalog centers.

use ndarray::{s, Array2, ArrayView2};

use crate::error::{EyeballError, Result};

/// A (row, col) position in pixel coordinates of some plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    pub row: f64,
    pub col: f64,
}

impl Center {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

/// An owned crop of a plane together with the center in the crop's own frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Cutout<T> {
    pub image: Array2<T>,
    pub center: Center,
}

/// Inclusive window along one axis, clamped to `[0, len - 1]`.
///
/// Returns `(first, last)` with `first <= last`.
fn clamped_window(center: f64, size: usize, len: usize) -> (usize, usize) {
    let half = (size as f64 - 1.0) / 2.0;
    let first = (center - half).floor() as i64;
    let last = first + size as i64 - 1;

    let first = first.max(0) as usize;
    let last = (last.min(len as i64 - 1)).max(first as i64) as usize;
    (first, last)
}

fn check_center(shape: (usize, usize), center: Center) -> Result<()> {
    let (rows, cols) = shape;
    let inside = |v: f64, len: usize| v >= 0.0 && v <= len as f64 - 1.0;
    if rows == 0 || cols == 0 || !inside(center.row, rows) || !inside(center.col, cols) {
        return Err(EyeballError::CenterOutOfBounds {
            row: center.row,
            col: center.col,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Extract a cutout of at most `size × size` pixels centered on `center`.
///
/// The window is clamped to the image, so near an edge the returned
/// sub-image is smaller than requested. The returned center is expressed
/// relative to the first row and column of the crop.
///
/// # Errors
/// * `CenterOutOfBounds` if the center lies outside the image
/// * `InvalidCutoutSize` if `size` is zero
pub fn extract<T: Clone>(image: ArrayView2<T>, center: Center, size: usize) -> Result<Cutout<T>> {
    if size == 0 {
        return Err(EyeballError::InvalidCutoutSize {
            rows: 0,
            cols: 0,
            size,
        });
    }
    let (rows, cols) = image.dim();
    check_center((rows, cols), center)?;

    let (row_first, row_last) = clamped_window(center.row, size, rows);
    let (col_first, col_last) = clamped_window(center.col, size, cols);

    let crop = image
        .slice(s![row_first..=row_last, col_first..=col_last])
        .to_owned();

    Ok(Cutout {
        image: crop,
        center: Center::new(center.row - row_first as f64, center.col - col_first as f64),
    })
}

/// Extract a cutout that must be exactly `size × size`.
///
/// Used when cutouts are tiled into a mosaic. Centers are expected to have
/// been filtered for edge clearance already, so any clamping is an error.
///
/// # Errors
/// `CenterOutOfBounds` if the center is outside the image or the window
/// had to be clamped.
pub fn extract_fixed<T: Clone>(
    image: ArrayView2<T>,
    center: Center,
    size: usize,
) -> Result<Cutout<T>> {
    let cutout = extract(image, center, size)?;
    if cutout.image.dim() != (size, size) {
        let (rows, cols) = image.dim();
        return Err(EyeballError::CenterOutOfBounds {
            row: center.row,
            col: center.col,
            rows,
            cols,
        });
    }
    Ok(cutout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(rows: usize, cols: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f32)
    }

    #[test]
    fn test_interior_cutout_has_full_size() {
        let image = ramp(1000, 1000);
        let cutout = extract(image.view(), Center::new(500.0, 500.0), 32).unwrap();

        assert_eq!(cutout.image.dim(), (32, 32));
        // half window 15.5 -> first index floor(484.5) = 484
        assert_eq!(cutout.image[[0, 0]], image[[484, 484]]);
        assert_relative_eq!(cutout.center.row, 16.0);
        assert_relative_eq!(cutout.center.col, 16.0);
    }

    #[test]
    fn test_cutout_clamped_at_top_left() {
        let image = ramp(1000, 1000);
        let cutout = extract(image.view(), Center::new(5.0, 5.0), 32).unwrap();

        let (rows, cols) = cutout.image.dim();
        assert!(rows < 32 && cols < 32);
        // first = floor(5 - 15.5) = -11 clamps to 0, last = -11 + 31 = 20
        assert_eq!((rows, cols), (21, 21));
        assert_eq!(cutout.image[[0, 0]], image[[0, 0]]);
        assert_relative_eq!(cutout.center.row, 5.0);
        assert_relative_eq!(cutout.center.col, 5.0);
    }

    #[test]
    fn test_cutout_clamped_at_bottom_right() {
        let image = ramp(100, 80);
        let cutout = extract(image.view(), Center::new(98.0, 79.0), 10).unwrap();

        // rows: first = floor(98 - 4.5) = 93, last clamps to 99
        // cols: first = floor(79 - 4.5) = 74, last clamps to 79
        assert_eq!(cutout.image.dim(), (7, 6));
        assert_eq!(cutout.image[[6, 5]], image[[99, 79]]);
        assert_relative_eq!(cutout.center.row, 5.0);
        assert_relative_eq!(cutout.center.col, 5.0);
    }

    #[test]
    fn test_cutout_is_a_copy() {
        let mut image = ramp(50, 50);
        let cutout = extract(image.view(), Center::new(25.0, 25.0), 8).unwrap();
        let before = cutout.image.clone();

        image.fill(-1.0);

        assert_eq!(cutout.image, before);
    }

    #[test]
    fn test_center_out_of_bounds() {
        let image = ramp(20, 30);
        for center in [
            Center::new(-0.5, 10.0),
            Center::new(10.0, 29.5),
            Center::new(20.0, 0.0),
            Center::new(f64::NAN, 3.0),
        ] {
            assert!(matches!(
                extract(image.view(), center, 4),
                Err(EyeballError::CenterOutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let image = ramp(20, 20);
        assert!(matches!(
            extract(image.view(), Center::new(10.0, 10.0), 0),
            Err(EyeballError::InvalidCutoutSize { .. })
        ));
    }

    #[test]
    fn test_extract_fixed_requires_full_window() {
        let image = ramp(64, 64);
        let cutout = extract_fixed(image.view(), Center::new(32.0, 32.0), 16).unwrap();
        assert_eq!(cutout.image.dim(), (16, 16));

        assert!(matches!(
            extract_fixed(image.view(), Center::new(3.0, 32.0), 16),
            Err(EyeballError::CenterOutOfBounds { .. })
        ));
    }
}

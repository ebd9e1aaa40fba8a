//! Tiling of fixed-size cutouts into a near-square grid for visual review.

use ndarray::{s, Array2};
use num_traits::Zero;

use crate::error::{EyeballError, Result};

/// Smallest square or near-square grid `(rows, cols)` holding `n` cells.
///
/// With `s = floor(sqrt(n))`: `s × s` when `n == s²`, `s × (s + 1)` when
/// `n <= s * (s + 1)`, otherwise `(s + 1) × (s + 1)`.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }

    let mut side = (n as f64).sqrt() as usize;
    // float sqrt can land one off for large n
    while side * side > n {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= n {
        side += 1;
    }

    if side * side == n {
        (side, side)
    } else if n <= side * (side + 1) {
        (side, side + 1)
    } else {
        (side + 1, side + 1)
    }
}

/// Tile cutouts row-major into a single plane.
///
/// Cutout `i` occupies grid cell `(i / cols, i % cols)`. Unused trailing
/// cells stay zero.
///
/// # Errors
/// `InvalidCutoutSize` if any cutout is not exactly `cutout_size × cutout_size`.
pub fn assemble<T>(cutouts: &[Array2<T>], cutout_size: usize) -> Result<Array2<T>>
where
    T: Clone + Zero,
{
    let (grid_rows, grid_cols) = grid_shape(cutouts.len());
    let mut mosaic = Array2::<T>::zeros((grid_rows * cutout_size, grid_cols * cutout_size));

    for (i, cutout) in cutouts.iter().enumerate() {
        let (rows, cols) = cutout.dim();
        if rows != cutout_size || cols != cutout_size {
            return Err(EyeballError::InvalidCutoutSize {
                rows,
                cols,
                size: cutout_size,
            });
        }

        let row0 = (i / grid_cols) * cutout_size;
        let col0 = (i % grid_cols) * cutout_size;
        mosaic
            .slice_mut(s![row0..row0 + cutout_size, col0..col0 + cutout_size])
            .assign(cutout);
    }

    Ok(mosaic)
}

//! Integer-factor resolution changes for image and mask planes.
//!
//! Both rebinners share the same block-to-output mapping: output pixel
//! `[i, j]` aggregates input rows `i*f..(i+1)*f` and columns `j*f..(j+1)*f`.
//! Overlaying a mean-rebinned image with its OR-rebinned mask therefore
//! stays pixel aligned.

use ndarray::{Array2, ArrayView2, Zip};
use num_traits::{Float, Zero};
use std::ops::BitOr;

use crate::error::{EyeballError, Result};

/// Validate that `factor` evenly divides both axes, returning the reduced shape.
fn reduced_shape(shape: (usize, usize), factor: usize) -> Result<(usize, usize)> {
    let (rows, cols) = shape;
    if factor == 0 || rows % factor != 0 || cols % factor != 0 {
        return Err(EyeballError::InvalidShape { rows, cols, factor });
    }
    Ok((rows / factor, cols / factor))
}

/// Reduce a bitmask by OR-ing every `factor × factor` block.
///
/// Any bit set anywhere in a block is set in the reduced pixel, so a flagged
/// input pixel can never disappear from the reduced mask.
///
/// # Errors
/// `InvalidShape` if `factor` is zero or does not divide both dimensions.
pub fn rebin_or<T>(mask: ArrayView2<T>, factor: usize) -> Result<Array2<T>>
where
    T: Copy + Zero + BitOr<Output = T>,
{
    let out_shape = reduced_shape(mask.dim(), factor)?;
    let mut out = Array2::<T>::zeros(out_shape);

    Zip::from(&mut out)
        .and(mask.exact_chunks((factor, factor)))
        .for_each(|pixel, block| {
            *pixel = block.fold(T::zero(), |acc, &bits| acc | bits);
        });

    Ok(out)
}

/// Reduce an intensity image by averaging every `factor × factor` block.
///
/// Block sums are accumulated in `f64` and divided by `factor²`.
///
/// # Errors
/// `InvalidShape` if `factor` is zero or does not divide both dimensions.
pub fn rebin_mean<T>(image: ArrayView2<T>, factor: usize) -> Result<Array2<T>>
where
    T: Float,
{
    let out_shape = reduced_shape(image.dim(), factor)?;
    let norm = (factor * factor) as f64;
    let mut out = Array2::<T>::zeros(out_shape);

    Zip::from(&mut out)
        .and(image.exact_chunks((factor, factor)))
        .for_each(|pixel, block| {
            let sum: f64 = block.iter().filter_map(|v| v.to_f64()).sum();
            *pixel = T::from(sum / norm).unwrap_or_else(T::nan);
        });

    Ok(out)
}

/// Enlarge an array by duplicating each pixel into a `factor × factor` block.
///
/// # Errors
/// `InvalidShape` if `factor` is zero.
pub fn boost<T: Clone>(image: ArrayView2<T>, factor: usize) -> Result<Array2<T>> {
    let (rows, cols) = image.dim();
    if factor == 0 {
        return Err(EyeballError::InvalidShape { rows, cols, factor });
    }

    Ok(Array2::from_shape_fn(
        (rows * factor, cols * factor),
        |(row, col)| image[[row / factor, col / factor]].clone(),
    ))
}

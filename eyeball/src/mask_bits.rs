//! Bad pixel mask bits and low-weight flagging.
//!
//! DESDM bad pixel masks use the low bits for detector defects. The
//! low-weight flag uses a bit above all bits currently assigned, so it can be
//! OR-ed into a mask without colliding with existing flags.

use ndarray::{Array2, ArrayView2, Zip};

/// Bit used to mark pixels whose weight is below threshold
pub const WEIGHT_BIT: u32 = 15;
pub const WEIGHT_FLAG: i32 = 1 << WEIGHT_BIT;

/// Suspect pixel flag assigned by the reduction pipeline
pub const BADPIX_SUSPECT: i32 = 2048;

/// Weight threshold used for the SV/Y1 reductions
pub const WEIGHT_LOWVAL_SVY1: f32 = 1.0e-4;

/// Copy of `mask` with [`WEIGHT_FLAG`] set wherever `weight < threshold`.
///
/// Returns the flagged mask and the number of newly low-weight pixels.
/// NaN weights are flagged as well.
pub fn flag_low_weight(
    mask: ArrayView2<i32>,
    weight: ArrayView2<f32>,
    threshold: f32,
) -> (Array2<i32>, usize) {
    let mut flagged = mask.to_owned();
    let mut count = 0;

    Zip::from(&mut flagged)
        .and(&weight)
        .for_each(|bits, &w| {
            if w < threshold || w.is_nan() {
                *bits |= WEIGHT_FLAG;
                count += 1;
            }
        });

    (flagged, count)
}

/// Count pixels with any of `bits` set.
pub fn count_flagged(mask: ArrayView2<i32>, bits: i32) -> usize {
    mask.iter().filter(|&&v| v & bits != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_weight_flag_value() {
        assert_eq!(WEIGHT_FLAG, 32768);
        assert_eq!(WEIGHT_FLAG & BADPIX_SUSPECT, 0);
    }

    #[test]
    fn test_flag_low_weight_preserves_existing_bits() {
        let mask = array![[0, BADPIX_SUSPECT], [1, 0]];
        let weight = array![[1.0f32, 0.0], [5.0e-5, f32::NAN]];

        let (flagged, count) = flag_low_weight(mask.view(), weight.view(), WEIGHT_LOWVAL_SVY1);

        assert_eq!(count, 3);
        assert_eq!(flagged[[0, 0]], 0);
        assert_eq!(flagged[[0, 1]], BADPIX_SUSPECT | WEIGHT_FLAG);
        assert_eq!(flagged[[1, 0]], 1 | WEIGHT_FLAG);
        assert_eq!(flagged[[1, 1]], WEIGHT_FLAG);
        assert_eq!(count_flagged(flagged.view(), WEIGHT_FLAG), 3);
        // input untouched
        assert_eq!(mask[[0, 1]], BADPIX_SUSPECT);
    }
}

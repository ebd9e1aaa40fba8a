//! Preview image output for quick-look inspection.
//!
//! Previews are 8-bit grayscale rasters produced from a stretched image.
//! JPEG is the default format; a `.png` extension selects PNG instead.
//! Files are written to a temporary path in the destination directory and
//! renamed into place, so a half-written preview is never visible under its
//! final name.
//!
//! # Orientation
//!
//! ndarray indexes `[row, col]` while the image crate addresses `(x, y)`.
//! Callers pass arrays already in display orientation (see
//! [`to_display_orientation`](crate::image_proc::stretch::to_display_orientation));
//! row 0 becomes the top line of the written image.

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageFormat, Luma};
use ndarray::{Array2, ArrayView2};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{EyeballError, Result};
use crate::image_proc::rebin::{boost, rebin_mean};
use crate::image_proc::stretch::{asinh_stretch, bytescale, to_display_orientation, StretchParams};
use crate::io::{ensure_parent_dir, AtomicFile};

/// JPEG quality used for all previews
pub const JPEG_QUALITY: u8 = 90;

/// Convert a `[row, col]` byte array into a grayscale image buffer.
pub fn array2_to_gray_image(image: ArrayView2<u8>) -> GrayImage {
    let (height, width) = image.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([image[[y as usize, x as usize]]])
    })
}

/// Save an 8-bit grayscale array as JPEG (or PNG for a `.png` path).
///
/// # Errors
/// `OutputWrite` if the destination directory cannot be created or the
/// finished file cannot be moved into place.
pub fn save_u8_image<P: AsRef<Path>>(image: ArrayView2<u8>, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let buffer = array2_to_gray_image(image);
    let is_png = ImageFormat::from_path(path).ok() == Some(ImageFormat::Png);

    let mut atomic = AtomicFile::new(path)?;
    {
        let mut writer = BufWriter::new(atomic.file_mut());
        if is_png {
            buffer.write_to(&mut writer, ImageFormat::Png)?;
        } else {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            buffer.write_with_encoder(encoder)?;
        }
        writer
            .flush()
            .map_err(|e| EyeballError::output_write(path, e))?;
    }
    atomic.commit()
}

/// Stretch, orient and byte-scale an image for display.
pub fn prepare_preview(image: ArrayView2<f32>, params: &StretchParams) -> Array2<u8> {
    let stretched = asinh_stretch(image, params);
    let oriented = to_display_orientation(stretched.view());
    bytescale(oriented.view())
}

/// Write a rebinned preview of a full field.
///
/// `rebin <= 1` writes the field at full resolution.
pub fn write_field_preview<P: AsRef<Path>>(
    image: ArrayView2<f32>,
    rebin: usize,
    params: &StretchParams,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    info!("writing field preview {} (rebin {})", path.display(), rebin);

    let bytes = if rebin > 1 {
        let reduced = rebin_mean(image, rebin)?;
        prepare_preview(reduced.view(), params)
    } else {
        prepare_preview(image, params)
    };
    save_u8_image(bytes.view(), path, JPEG_QUALITY)
}

/// Write an enlarged preview of a cutout mosaic.
pub fn write_mosaic_preview<P: AsRef<Path>>(
    mosaic: ArrayView2<f32>,
    boost_factor: usize,
    params: &StretchParams,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    info!("writing mosaic preview {} (boost {})", path.display(), boost_factor);

    let enlarged = boost(mosaic, boost_factor)?;
    let bytes = prepare_preview(enlarged.view(), params);
    save_u8_image(bytes.view(), path, JPEG_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_array2_to_gray_image_coordinates() {
        let image = array![[1u8, 2, 3], [4, 5, 6]];
        let buffer = array2_to_gray_image(image.view());

        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.get_pixel(2, 0).0, [3]);
        assert_eq!(buffer.get_pixel(0, 1).0, [4]);
    }

    #[test]
    fn test_prepare_preview_orientation_and_range() {
        let mut image = Array2::<f32>::zeros((4, 6));
        image[[3, 0]] = 1.0e6;

        let bytes = prepare_preview(image.view(), &StretchParams::default());

        // transposed: 6 x 4, bottom-left source pixel lands at the top-left
        assert_eq!(bytes.dim(), (6, 4));
        assert_eq!(bytes[[0, 0]], 255);
        assert_eq!(bytes.iter().filter(|&&v| v != 0).count(), 1);
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preview.png");
        let image = array![[0u8, 64], [128, 255]];

        save_u8_image(image.view(), &path, JPEG_QUALITY).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(1, 1).0, [255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [64]);
        // no temporary files left behind
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_field_preview_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.jpg");
        let image = Array2::<f32>::from_shape_fn((16, 8), |(r, c)| (r + c) as f32 * 50.0);

        write_field_preview(image.view(), 4, &StretchParams::default(), &path).unwrap();

        let decoded = image::open(&path).unwrap();
        // rebinned to 4 x 2, then transposed
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn test_write_field_preview_rejects_bad_rebin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.jpg");
        let image = Array2::<f32>::zeros((10, 10));

        assert!(matches!(
            write_field_preview(image.view(), 4, &StretchParams::default(), &path),
            Err(EyeballError::InvalidShape { .. })
        ));
        assert!(!path.exists());
    }
}

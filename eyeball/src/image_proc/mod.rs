//! Image processing for eyeball products.
//!
//! # Module Organization
//!
//! - **rebin**: block reduction of masks (bitwise OR) and images (mean), and
//!   enlargement by pixel duplication
//! - **cutout**: bounded sub-images around catalog centers
//! - **mosaic**: near-square tiling of fixed-size cutouts
//! - **stretch**: asinh tone mapping, byte scaling and display orientation
//! - **io**: JPEG/PNG preview output

pub mod cutout;
pub mod io;
pub mod mosaic;
pub mod rebin;
pub mod stretch;

pub use cutout::{extract, extract_fixed, Center, Cutout};
pub use mosaic::{assemble, grid_shape};
pub use rebin::{boost, rebin_mean, rebin_or};
pub use stretch::{asinh_stretch, bytescale, to_display_orientation, StretchParams};

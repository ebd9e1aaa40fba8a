//! Eyeball products for visual quality assessment of CCD exposures.
//!
//! An eyeball product condenses one chip into something a person can scan in
//! seconds: the background-subtracted field and its bad pixel mask reduced by
//! an integer factor, and a mosaic of cutouts around bright catalog stars.
//! See [`product`] for the pipeline and [`container`] for the file
//! abstraction it is written against.

pub mod config;
pub mod container;
pub mod error;
pub mod exposure;
pub mod image_proc;
pub mod io;
pub mod mask_bits;
pub mod product;
pub mod selection;

use ndarray::Array2;

/// Floating point intensity plane (science, weight, background, mosaic)
pub type ImagePlane = Array2<f32>;

/// Integer bitmask plane
pub type MaskPlane = Array2<i32>;

pub use config::EyeballConfig;
pub use error::{EyeballError, Result};
pub use exposure::Exposure;
pub use product::{run_eyeball, EyeballBuilder, EyeballPaths, EyeballProduct, ProductMetadata};
pub use selection::{Catalog, CatalogEntry};

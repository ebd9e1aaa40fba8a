//! Choice of catalog objects to cut out.
//!
//! Good cutout centers are unflagged, bright but not saturated, and far
//! enough from the chip edge that a full cutout fits. From those, a
//! reproducible random subset is drawn so that repeated runs on the same
//! file pick the same objects.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::{CatalogColumns, SelectionConfig};
use crate::container::SectionReader;
use crate::error::{EyeballError, Result};
use crate::image_proc::cutout::Center;

/// One row of a source catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub row: f64,
    pub col: f64,
    pub mag: f64,
    pub flags: i32,
}

impl CatalogEntry {
    pub fn center(&self) -> Center {
        Center::new(self.row, self.col)
    }
}

/// Source catalog of one chip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Read the row, column, magnitude and flag columns of a catalog table.
    ///
    /// # Errors
    /// `SourceRead` if a column is missing or the columns differ in length.
    pub fn read<R: SectionReader>(reader: &mut R, columns: &CatalogColumns) -> Result<Self> {
        let section = &columns.section;
        let rows = reader.read_column_f64(section, &columns.row)?;
        let cols = reader.read_column_f64(section, &columns.col)?;
        let mags = reader.read_column_f64(section, &columns.mag)?;
        let flags = reader.read_column_i32(section, &columns.flags)?;

        let n = rows.len();
        if cols.len() != n || mags.len() != n || flags.len() != n {
            return Err(EyeballError::source_read(
                reader.source(),
                format!("catalog columns in '{section}' differ in length"),
            ));
        }

        let entries = rows
            .into_iter()
            .zip(cols)
            .zip(mags)
            .zip(flags)
            .map(|(((row, col), mag), flags)| CatalogEntry {
                row,
                col,
                mag,
                flags,
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True if a window of half-width `half` around `v` fits in `[0, len - 1]`.
fn fits_axis(v: f64, half: f64, len: usize) -> bool {
    v - half >= 0.0 && v + half <= len as f64 - 1.0
}

/// Indices of catalog entries usable as cutout centers, in catalog order.
///
/// An entry is kept when its flags are zero, its magnitude lies strictly
/// inside `(min_mag, max_mag)`, and a square window of half-width
/// `cutout_size / 2 + padding` around it lies inside `image_shape`.
/// Entries with NaN coordinates or magnitudes are silently excluded.
pub fn select(
    catalog: &Catalog,
    image_shape: (usize, usize),
    cutout_size: usize,
    config: &SelectionConfig,
) -> Vec<usize> {
    let (rows, cols) = image_shape;
    let half = cutout_size as f64 / 2.0 + config.padding as f64;

    let selected: Vec<usize> = catalog
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            entry.flags == 0
                && entry.mag > config.min_mag
                && entry.mag < config.max_mag
                && fits_axis(entry.row, half, rows)
                && fits_axis(entry.col, half, cols)
        })
        .map(|(idx, _)| idx)
        .collect();

    debug!(
        "selected {} of {} catalog entries (mag {} to {}, clearance {:.1} px)",
        selected.len(),
        catalog.len(),
        config.min_mag,
        config.max_mag,
        half
    );
    selected
}

/// Deterministic seed derived from a file name.
///
/// The decimal code points of the characters are concatenated and the first
/// ten digits kept, so the same name always gives the same seed.
pub fn seed_from_filename(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .map(|c| (c as u32).to_string())
        .collect::<String>()
        .chars()
        .take(10)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Draw up to `n` of `candidates` with `rng`, returned in ascending order.
pub fn choose_subset<R: Rng + ?Sized>(candidates: &[usize], n: usize, rng: &mut R) -> Vec<usize> {
    let mut shuffled = candidates.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(n);
    shuffled.sort_unstable();
    shuffled
}

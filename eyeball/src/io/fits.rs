//! FITS implementation of the named-section container.
//!
//! Sections are HDUs addressed by EXTNAME. Images are kept in FITS storage
//! order: array row `r` is the `r`-th stored line (NAXIS2 axis) and array
//! column `c` runs along NAXIS1. No flip is applied on read, so SExtractor
//! `YWIN_IMAGE` / `XWIN_IMAGE` coordinates index the arrays directly. Any
//! display reorientation is done explicitly by the caller before writing.

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::container::{ColumnData, SectionReader, SectionWriter, Table};
use crate::error::{EyeballError, Result};
use crate::io::{ensure_parent_dir, AtomicPath};

/// Reads image and table HDUs from an existing FITS file.
pub struct FitsReader {
    path: PathBuf,
    fptr: FitsFile,
}

impl FitsReader {
    /// Open a FITS file for reading.
    ///
    /// # Errors
    /// `SourceRead` if the file is missing or is not a readable FITS file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(EyeballError::source_read(&path, "file does not exist"));
        }
        let fptr = FitsFile::open(&path).map_err(|e| EyeballError::source_read(&path, e))?;
        debug!("opened {}", path.display());
        Ok(Self { path, fptr })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, section: &str, detail: impl std::fmt::Display) -> EyeballError {
        EyeballError::source_read(&self.path, format!("section '{section}': {detail}"))
    }

    fn hdu(&mut self, section: &str) -> Result<FitsHdu> {
        self.fptr
            .hdu(section)
            .map_err(|e| self.read_error(section, e))
    }

    fn image_shape(&self, section: &str, hdu: &FitsHdu) -> Result<(usize, usize)> {
        match &hdu.info {
            HduInfo::ImageInfo { shape, .. } if shape.len() == 2 => Ok((shape[0], shape[1])),
            HduInfo::ImageInfo { shape, .. } => Err(self.read_error(
                section,
                format!("expected a 2D image, found {} axes", shape.len()),
            )),
            _ => Err(self.read_error(section, "not an image HDU")),
        }
    }

    fn reshape<T>(&self, section: &str, shape: (usize, usize), data: Vec<T>) -> Result<Array2<T>> {
        Array2::from_shape_vec(shape, data)
            .map_err(|e| self.read_error(section, format!("cannot reshape image data: {e}")))
    }
}

impl SectionReader for FitsReader {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn read_image_f32(&mut self, section: &str) -> Result<Array2<f32>> {
        let hdu = self.hdu(section)?;
        let shape = self.image_shape(section, &hdu)?;
        let data: Vec<f32> = hdu
            .read_image(&mut self.fptr)
            .map_err(|e| self.read_error(section, e))?;
        self.reshape(section, shape, data)
    }

    fn read_image_i32(&mut self, section: &str) -> Result<Array2<i32>> {
        let hdu = self.hdu(section)?;
        let shape = self.image_shape(section, &hdu)?;
        let data: Vec<i32> = hdu
            .read_image(&mut self.fptr)
            .map_err(|e| self.read_error(section, e))?;
        self.reshape(section, shape, data)
    }

    fn read_column_f64(&mut self, section: &str, column: &str) -> Result<Vec<f64>> {
        let hdu = self.hdu(section)?;
        hdu.read_col::<f64>(&mut self.fptr, column)
            .map_err(|e| self.read_error(section, format!("column '{column}': {e}")))
    }

    fn read_column_i32(&mut self, section: &str, column: &str) -> Result<Vec<i32>> {
        let hdu = self.hdu(section)?;
        hdu.read_col::<i32>(&mut self.fptr, column)
            .map_err(|e| self.read_error(section, format!("column '{column}': {e}")))
    }

    fn read_column_string(&mut self, section: &str, column: &str) -> Result<Vec<String>> {
        let hdu = self.hdu(section)?;
        let values = hdu
            .read_col::<String>(&mut self.fptr, column)
            .map_err(|e| self.read_error(section, format!("column '{column}': {e}")))?;
        Ok(values.into_iter().map(|s| s.trim_end().to_string()).collect())
    }

    fn read_key_f64(&mut self, section: &str, key: &str) -> Option<f64> {
        let hdu = self.fptr.hdu(section).ok()?;
        hdu.read_key::<f64>(&mut self.fptr, key).ok()
    }

    fn has_section(&mut self, section: &str) -> bool {
        self.fptr.hdu(section).is_ok()
    }
}

/// Writes image and table HDUs to a new FITS file.
///
/// The file is built under a temporary name in the destination directory and
/// renamed onto the destination by [`finish`](SectionWriter::finish).
/// Dropping the writer before `finish` discards everything written.
pub struct FitsWriter {
    fptr: FitsFile,
    output: AtomicPath,
}

impl FitsWriter {
    /// Start a new FITS file that will replace `path` on success.
    ///
    /// # Errors
    /// `OutputWrite` if the destination directory is not writable.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let target = path.as_ref();
        ensure_parent_dir(target)?;
        let output = AtomicPath::new(target)?;
        let fptr = FitsFile::create(output.path())
            .overwrite()
            .open()
            .map_err(|e| EyeballError::output_write(target, e))?;
        debug!(
            "writing {} via {}",
            target.display(),
            output.path().display()
        );
        Ok(Self { fptr, output })
    }

    fn write_error(&self, section: &str, detail: impl std::fmt::Display) -> EyeballError {
        EyeballError::output_write(self.output.target(), format!("section '{section}': {detail}"))
    }

    fn create_image(
        &mut self,
        section: &str,
        shape: (usize, usize),
        data_type: ImageType,
    ) -> Result<FitsHdu> {
        let dimensions = [shape.0, shape.1];
        let description = ImageDescription {
            data_type,
            dimensions: &dimensions,
        };
        self.fptr
            .create_image(section.to_string(), &description)
            .map_err(|e| self.write_error(section, e))
    }
}

/// Contiguous row-major copy of an array, in FITS storage order.
fn storage_order<T: Clone>(image: &Array2<T>) -> Vec<T> {
    image.iter().cloned().collect()
}

/// Smallest width given to a string column.
const MIN_STRING_WIDTH: usize = 64;

/// Width of a string column holding `values`.
///
/// fitsio reads each cell into a buffer of exactly the column width and
/// cfitsio writes a NUL terminator one byte past it, so the width always
/// leaves room beyond the longest value and is kept at a multiple of 16.
fn string_column_width(values: &[String]) -> usize {
    let longest = values.iter().map(String::len).max().unwrap_or(0);
    (longest + 1).max(MIN_STRING_WIDTH).next_multiple_of(16)
}

impl SectionWriter for FitsWriter {
    fn write_image_f32(&mut self, section: &str, image: &Array2<f32>) -> Result<()> {
        let hdu = self.create_image(section, image.dim(), ImageType::Float)?;
        hdu.write_image(&mut self.fptr, &storage_order(image))
            .map_err(|e| self.write_error(section, e))?;
        Ok(())
    }

    fn write_image_i32(&mut self, section: &str, image: &Array2<i32>) -> Result<()> {
        let hdu = self.create_image(section, image.dim(), ImageType::Long)?;
        hdu.write_image(&mut self.fptr, &storage_order(image))
            .map_err(|e| self.write_error(section, e))?;
        Ok(())
    }

    fn write_table(&mut self, section: &str, table: &Table) -> Result<()> {
        let mut descriptions = Vec::with_capacity(table.columns().len());
        for (name, data) in table.columns() {
            let description = match data {
                ColumnData::F64(_) => ColumnDescription::new(name)
                    .with_type(ColumnDataType::Double)
                    .create(),
                ColumnData::I32(_) => ColumnDescription::new(name)
                    .with_type(ColumnDataType::Int)
                    .create(),
                ColumnData::Str(values) => ColumnDescription::new(name)
                    .with_type(ColumnDataType::String)
                    .that_repeats(string_column_width(values))
                    .create(),
            };
            descriptions.push(description.map_err(|e| self.write_error(section, e))?);
        }

        let hdu = self
            .fptr
            .create_table(section.to_string(), &descriptions)
            .map_err(|e| self.write_error(section, e))?;

        for (name, data) in table.columns() {
            let written = match data {
                ColumnData::F64(values) => hdu.write_col(&mut self.fptr, name, values),
                ColumnData::I32(values) => hdu.write_col(&mut self.fptr, name, values),
                ColumnData::Str(values) => hdu.write_col(&mut self.fptr, name, values),
            };
            written.map_err(|e| self.write_error(section, format!("column '{name}': {e}")))?;
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        let FitsWriter { fptr, output } = self;
        // close before the rename so all buffers are flushed
        drop(fptr);
        output.commit()
    }
}

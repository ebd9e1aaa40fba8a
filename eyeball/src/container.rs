//! Named-section containers.
//!
//! Inputs and outputs are multi-section files: images and tables addressed
//! by name. The core logic only talks to the [`SectionReader`] and
//! [`SectionWriter`] traits; [`crate::io::fits`] implements them on FITS files
//! and [`MemoryContainer`] keeps sections in memory.

use ndarray::Array2;
use std::collections::BTreeMap;

use crate::error::{EyeballError, Result};

/// One column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    F64(Vec<f64>),
    I32(Vec<i32>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::F64(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table of equal-length named columns, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, ColumnData)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. All columns must have the same length.
    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<Self> {
        if let Some((first, existing)) = self.columns.first() {
            if existing.len() != data.len() {
                return Err(EyeballError::InvalidConfig(format!(
                    "column '{name}' has {} rows but '{first}' has {}",
                    data.len(),
                    existing.len()
                )));
            }
        }
        self.columns.push((name.to_string(), data));
        Ok(self)
    }

    pub fn columns(&self) -> &[(String, ColumnData)] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| c)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }
}

/// Read access to a multi-section container.
pub trait SectionReader {
    /// Human readable origin used in error messages (usually a path).
    fn source(&self) -> String;

    fn read_image_f32(&mut self, section: &str) -> Result<Array2<f32>>;

    fn read_image_i32(&mut self, section: &str) -> Result<Array2<i32>>;

    fn read_column_f64(&mut self, section: &str, column: &str) -> Result<Vec<f64>>;

    fn read_column_i32(&mut self, section: &str, column: &str) -> Result<Vec<i32>>;

    fn read_column_string(&mut self, section: &str, column: &str) -> Result<Vec<String>>;

    /// Numeric header value of a section, `None` if absent.
    fn read_key_f64(&mut self, section: &str, key: &str) -> Option<f64>;

    fn has_section(&mut self, section: &str) -> bool;
}

/// Write access to a multi-section container.
///
/// Nothing is visible at the destination until [`finish`](SectionWriter::finish)
/// succeeds.
pub trait SectionWriter {
    fn write_image_f32(&mut self, section: &str, image: &Array2<f32>) -> Result<()>;

    fn write_image_i32(&mut self, section: &str, image: &Array2<i32>) -> Result<()>;

    fn write_table(&mut self, section: &str, table: &Table) -> Result<()>;

    fn finish(self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
enum Section {
    F32(Array2<f32>),
    I32(Array2<i32>),
    Table(Table),
}

/// Container that keeps every section in memory.
///
/// Section names are matched case-insensitively, as FITS EXTNAMEs are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContainer {
    name: String,
    sections: BTreeMap<String, Section>,
    keys: BTreeMap<(String, String), f64>,
}

impl MemoryContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Attach a numeric header value to a section.
    pub fn set_key_f64(&mut self, section: &str, key: &str, value: f64) {
        self.keys
            .insert((section.to_ascii_lowercase(), key.to_ascii_uppercase()), value);
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    fn get(&self, section: &str) -> Result<&Section> {
        self.sections
            .get(&section.to_ascii_lowercase())
            .ok_or_else(|| self.missing(section, "no such section"))
    }

    fn missing(&self, section: &str, detail: &str) -> EyeballError {
        EyeballError::source_read(&self.name, format!("section '{section}': {detail}"))
    }

    fn table(&self, section: &str, column: &str) -> Result<&ColumnData> {
        match self.get(section)? {
            Section::Table(table) => table
                .column(column)
                .ok_or_else(|| self.missing(section, &format!("no column '{column}'"))),
            _ => Err(self.missing(section, "not a table")),
        }
    }
}

impl SectionReader for MemoryContainer {
    fn source(&self) -> String {
        self.name.clone()
    }

    fn read_image_f32(&mut self, section: &str) -> Result<Array2<f32>> {
        match self.get(section)? {
            Section::F32(image) => Ok(image.clone()),
            Section::I32(image) => Ok(image.mapv(|v| v as f32)),
            Section::Table(_) => Err(self.missing(section, "not an image")),
        }
    }

    fn read_image_i32(&mut self, section: &str) -> Result<Array2<i32>> {
        match self.get(section)? {
            Section::I32(image) => Ok(image.clone()),
            Section::F32(image) => Ok(image.mapv(|v| v as i32)),
            Section::Table(_) => Err(self.missing(section, "not an image")),
        }
    }

    fn read_column_f64(&mut self, section: &str, column: &str) -> Result<Vec<f64>> {
        match self.table(section, column)? {
            ColumnData::F64(v) => Ok(v.clone()),
            ColumnData::I32(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            ColumnData::Str(_) => Err(self.missing(section, &format!("'{column}' is not numeric"))),
        }
    }

    fn read_column_i32(&mut self, section: &str, column: &str) -> Result<Vec<i32>> {
        match self.table(section, column)? {
            ColumnData::I32(v) => Ok(v.clone()),
            ColumnData::F64(v) => Ok(v.iter().map(|&x| x as i32).collect()),
            ColumnData::Str(_) => Err(self.missing(section, &format!("'{column}' is not numeric"))),
        }
    }

    fn read_column_string(&mut self, section: &str, column: &str) -> Result<Vec<String>> {
        match self.table(section, column)? {
            ColumnData::Str(v) => Ok(v.clone()),
            _ => Err(self.missing(section, &format!("'{column}' is not a string column"))),
        }
    }

    fn read_key_f64(&mut self, section: &str, key: &str) -> Option<f64> {
        self.keys
            .get(&(section.to_ascii_lowercase(), key.to_ascii_uppercase()))
            .copied()
    }

    fn has_section(&mut self, section: &str) -> bool {
        self.sections.contains_key(&section.to_ascii_lowercase())
    }
}

impl SectionWriter for &mut MemoryContainer {
    fn write_image_f32(&mut self, section: &str, image: &Array2<f32>) -> Result<()> {
        self.sections
            .insert(section.to_ascii_lowercase(), Section::F32(image.clone()));
        Ok(())
    }

    fn write_image_i32(&mut self, section: &str, image: &Array2<i32>) -> Result<()> {
        self.sections
            .insert(section.to_ascii_lowercase(), Section::I32(image.clone()));
        Ok(())
    }

    fn write_table(&mut self, section: &str, table: &Table) -> Result<()> {
        self.sections
            .insert(section.to_ascii_lowercase(), Section::Table(table.clone()));
        Ok(())
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

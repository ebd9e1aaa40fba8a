//! Error taxonomy for eyeball product generation.
//!
//! Every failure is unrecoverable for the exposure being processed: the
//! builder aborts and the error is surfaced to the process exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building an eyeball product
#[derive(Error, Debug)]
pub enum EyeballError {
    #[error("shape ({rows}, {cols}) is not divisible by rebin factor {factor}")]
    InvalidShape {
        rows: usize,
        cols: usize,
        factor: usize,
    },
    #[error("no catalog entries passed the cutout selection")]
    NoCandidates,
    #[error("center ({row}, {col}) is out of bounds for image of shape ({rows}, {cols})")]
    CenterOutOfBounds {
        row: f64,
        col: f64,
        rows: usize,
        cols: usize,
    },
    #[error("cutout of shape ({rows}, {cols}) does not match cutout size {size}")]
    InvalidCutoutSize {
        rows: usize,
        cols: usize,
        size: usize,
    },
    #[error("failed to read {path}: {detail}")]
    SourceRead { path: PathBuf, detail: String },
    #[error("failed to write {path}: {detail}")]
    OutputWrite { path: PathBuf, detail: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("FITS I/O error: {0}")]
    Fits(#[from] fitsio::errors::Error),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EyeballError {
    pub(crate) fn source_read(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        EyeballError::SourceRead {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        EyeballError::OutputWrite {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EyeballError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EyeballError::InvalidShape {
            rows: 10,
            cols: 12,
            factor: 4,
        };
        assert!(error.to_string().contains("(10, 12)"));
        assert!(error.to_string().contains("factor 4"));

        let error = EyeballError::source_read("/data/missing.fits", "file not found");
        assert_eq!(
            error.to_string(),
            "failed to read /data/missing.fits: file not found"
        );
    }
}

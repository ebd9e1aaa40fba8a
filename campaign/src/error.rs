//! Errors raised while preparing or indexing a production run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("invalid run configuration {path}: {detail}")]
    Config { path: PathBuf, detail: String },
    #[error("malformed exposure list {path}, line {line}: {content:?}")]
    ExposureList {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("cannot open database: {0}")]
    Connection(#[from] diesel::ConnectionError),
}

impl CampaignError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CampaignError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CampaignError>;

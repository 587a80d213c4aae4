use mzdata::spectrum::bindata::ArrayRetrievalError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeakPickerError {
    #[error("Data reading error: {0}")]
    DataReading(#[from] DataReadingError),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, PeakPickerError>;

impl PeakPickerError {
    pub fn invalid_parameters(msg: impl std::fmt::Display) -> Self {
        Self::InvalidParameters(msg.to_string())
    }
}

#[derive(Error, Debug)]
pub enum DataReadingError {
    #[error("Scan {index} is malformed: {reason}")]
    MalformedScan { index: usize, reason: String },

    #[error("Scan {index} arrived after scan {previous}, scans must be in acquisition order")]
    ScanOutOfOrder { index: usize, previous: usize },

    #[error("Requested scan {requested} but the source only has {available} scans")]
    ScanIndexOutOfBounds { requested: usize, available: usize },

    #[error("Could not decode the arrays of spectrum {index}: {source}")]
    ArrayRetrieval {
        index: usize,
        #[source]
        source: ArrayRetrievalError,
    },

    #[error("Could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataReadingError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedScan {
            index,
            reason: reason.into(),
        }
    }
}

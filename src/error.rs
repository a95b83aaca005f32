//! Error types for the fcref library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fcref operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning archives.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A required archive member is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A required input was not supplied.
    #[error("Usage: {0}")]
    Usage(String),

    /// An archive could not be opened or read.
    #[error("Cannot read archive {}: {reason}", path.display())]
    ArchiveRead {
        /// Path of the offending archive
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Error during rendering.
    #[error("Render error: {0}")]
    Render(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

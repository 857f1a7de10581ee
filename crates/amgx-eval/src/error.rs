//! Error types for the solve driver.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ReturnCode;

/// Errors that can occur while driving an AMGX solve.
#[derive(Debug, Error)]
pub enum AmgxError {
    /// An AMGX call returned a non-success code.
    #[error("{operation} failed - {message}")]
    Library {
        /// Name of the C entry point that failed.
        operation: &'static str,
        code: ReturnCode,
        /// Text from `AMGX_get_error_string`.
        message: String,
    },

    /// The AMGX shared library or one of its symbols could not be loaded.
    #[error("Failed to load AMGX library: {0}")]
    LibraryLoad(String),

    /// The system file does not exist.
    #[error("System file not found: {}", .0.display())]
    SystemFileNotFound(PathBuf),

    /// A path could not be passed to C (interior NUL byte).
    #[error("Path cannot be passed to AMGX: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Unrecognised mode tag.
    #[error("Unknown AMGX mode '{0}' (expected one of hDDI, hDFI, hFFI, dDDI, dDFI, dFFI)")]
    UnknownMode(String),

    /// Writing progress output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, AmgxError>;

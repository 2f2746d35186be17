//! Error types for uar-lib

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Cannot open archive {path:?}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive '{archive}' is not readable: {message}")]
    ArchiveCorrupt { archive: String, message: String },

    #[error("Cannot prepare output directory {path:?}: {source}")]
    DirectoryPrepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read member '{member}': {message}")]
    MemberRead { member: String, message: String },

    #[error("Cannot write {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot decompress {path:?}: {message}")]
    Decompression { path: PathBuf, message: String },

    #[error("Cannot reorganize {path:?}: {message}")]
    Reorganization { path: PathBuf, message: String },

    #[error("An extraction is already running")]
    AlreadyRunning,
}

impl Error {
    /// The kind of this error, suitable for sending across the progress
    /// channel without cloning the underlying sources.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Error::ArchiveOpen { .. } => ErrorKind::ArchiveOpen,
            Error::ArchiveCorrupt { .. } => ErrorKind::ArchiveCorrupt,
            Error::DirectoryPrepare { .. } => ErrorKind::DirectoryPrepare,
            Error::MemberRead { .. } => ErrorKind::MemberRead,
            Error::OutputWrite { .. } => ErrorKind::OutputWrite,
            Error::Decompression { .. } => ErrorKind::Decompression,
            Error::Reorganization { .. } => ErrorKind::Reorganization,
            Error::AlreadyRunning => ErrorKind::AlreadyRunning,
        }
    }
}

/// Error discriminant carried by the terminal `Failed` progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPattern,
    ArchiveOpen,
    ArchiveCorrupt,
    DirectoryPrepare,
    MemberRead,
    OutputWrite,
    Decompression,
    Reorganization,
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the rebrand-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with detailed error variants for different failure modes.
//!
//! Every failure carries the operation that failed (reading a header, writing a
//! header, decompressing, copying a payload) and the archive layer it occurred
//! in. End-of-archive is never an error; it is the normal terminal condition of
//! both transcoder loops.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rebrand operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all rebrand operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a member header from the outer ar archive
    #[error("failed to read header from ar archive: {source}")]
    ArHeaderRead {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a member payload from the outer ar archive
    #[error("failed to copy member '{name}' inside of ar archive: {source}")]
    ArMemberRead {
        /// Identifier of the member being copied
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a member header or payload to the outer ar archive
    #[error("failed to write member '{name}' to ar archive: {source}")]
    ArWrite {
        /// Identifier of the member being written
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to decompress the embedded xz stream
    #[error("failed to decompress xz stream: {source}")]
    Decompress {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an entry header from the embedded tar stream
    #[error("failed to read header from tar stream: {source}")]
    TarHeaderRead {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an entry payload from the embedded tar stream
    #[error("failed to read payload of tar entry '{name}': {source}")]
    TarPayloadRead {
        /// Name of the entry being read
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an entry to the output tar stream
    #[error("failed to write tar entry '{name}': {source}")]
    TarWrite {
        /// Name of the entry being written
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to finalize the output tar stream
    #[error("failed to finalize tar stream: {source}")]
    TarFinalize {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Tar entry name is not valid UTF-8
    #[error("tar entry name is not valid UTF-8: '{name}'")]
    InvalidMemberName {
        /// Lossy rendering of the offending name
        name: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ar header read error
    pub fn ar_header_read(source: std::io::Error) -> Self {
        Self::ArHeaderRead { source }
    }

    /// Creates a new ar member read error
    pub fn ar_member_read(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::ArMemberRead {
            name: name.into(),
            source,
        }
    }

    /// Creates a new ar write error
    pub fn ar_write(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::ArWrite {
            name: name.into(),
            source,
        }
    }

    /// Creates a new decompression error
    pub fn decompress(source: std::io::Error) -> Self {
        Self::Decompress { source }
    }

    /// Creates a new tar header read error
    pub fn tar_header_read(source: std::io::Error) -> Self {
        Self::TarHeaderRead { source }
    }

    /// Creates a new tar payload read error
    pub fn tar_payload_read(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::TarPayloadRead {
            name: name.into(),
            source,
        }
    }

    /// Creates a new tar write error
    pub fn tar_write(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::TarWrite {
            name: name.into(),
            source,
        }
    }

    /// Creates a new tar finalize error
    pub fn tar_finalize(source: std::io::Error) -> Self {
        Self::TarFinalize { source }
    }

    /// Creates a new invalid member name error from the raw name bytes
    pub fn invalid_member_name(raw: &[u8]) -> Self {
        Self::InvalidMemberName {
            name: String::from_utf8_lossy(raw).into_owned(),
        }
    }

    /// Returns true if the error originated in the embedded tar layer
    pub fn is_tar_layer(&self) -> bool {
        matches!(
            self,
            Self::TarHeaderRead { .. }
                | Self::TarPayloadRead { .. }
                | Self::TarWrite { .. }
                | Self::TarFinalize { .. }
                | Self::InvalidMemberName { .. }
        )
    }
}

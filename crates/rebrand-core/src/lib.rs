//! # rebrand-core
//!
//! A library for rewriting embedded application identifiers inside Debian packages.
//!
//! This crate provides the core functionality for:
//! - Replacing a fixed byte pattern across arbitrary byte streams
//! - Transcoding an embedded tar stream with rewritten names and payloads
//! - Transcoding the outer ar container with corrected member sizes
//!
//! A `.deb` is an archive-of-archives: an outer `ar` container whose
//! `data.tar.xz` member holds the package's file tree as a compressed tar
//! stream. The pipeline decompresses that member, rewrites every entry name
//! and payload, and emits a new package whose data member is an uncompressed
//! tar stream under the corrected size.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`rewrite`]: Byte pattern replacement
//! - [`transcode`]: Tar and outer-archive transcoding
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use rebrand_core::transcode::transcode_file;
//!
//! transcode_file("bootstrap.deb", "bootstrap.deb.replaced")?;
//! # Ok::<(), rebrand_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! The library provides several seams for customization:
//!
//! - [`Rewrite`]: Customize the replacement strategy
//! - [`TranscodeConfig`]: Change which member is treated as the compressed
//!   tar payload
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod rewrite;
pub mod transcode;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use rewrite::{PatternPair, Rewrite, Rewriter};
pub use transcode::{DebTranscoder, TarTranscoder, TranscodeConfig};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier pattern replaced by default
pub const DEFAULT_FROM: &[u8] = b"com.termux";

/// Identifier emitted by default for every occurrence of [`DEFAULT_FROM`]
pub const DEFAULT_TO: &[u8] = b"com.octo4a";

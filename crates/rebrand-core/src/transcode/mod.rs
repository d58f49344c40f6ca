//! Package transcoding for the outer ar container.
//!
//! This module rewrites a Debian package (an `ar` archive) member by member
//! and is the entry point of the whole pipeline.
//!
//! ## Algorithm Overview
//!
//! 1. Read the next member header from the outer archive
//! 2. For the distinguished compressed-tar member (`data.tar.xz`),
//!    decompress it and run the tar stream through [`TarTranscoder`],
//!    capturing the rewritten output in memory
//! 3. For every other member, copy the payload through unchanged
//! 4. Emit the member with its size set to the buffered length, since the
//!    container format requires the size field to precede the payload
//!
//! The distinguished member is renamed to its uncompressed designation
//! (`data.tar`); the output is not recompressed.
//!
//! ## Example
//!
//! ```no_run
//! use rebrand_core::transcode::DebTranscoder;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let input = BufReader::new(File::open("bootstrap.deb")?);
//! let output = File::create("bootstrap.deb.replaced")?;
//! DebTranscoder::new().transcode(input, output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod tar;

use crate::error::{Error, Result};
use crate::rewrite::Rewriter;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;
use xz::read::XzDecoder;

pub use self::tar::TarTranscoder;

/// Configuration for the package transcoder
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Identifier of the member holding the compressed tar payload
    pub data_member: String,
    /// Identifier the rewritten, now-uncompressed member is emitted under
    pub rewritten_member: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            data_member: "data.tar.xz".to_string(),
            rewritten_member: "data.tar".to_string(),
        }
    }
}

impl TranscodeConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier of the compressed data member
    pub fn data_member(mut self, name: impl Into<String>) -> Self {
        self.data_member = name.into();
        self
    }

    /// Sets the identifier the rewritten member is emitted under
    pub fn rewritten_member(mut self, name: impl Into<String>) -> Self {
        self.rewritten_member = name.into();
        self
    }
}

/// Transcoder for the outer package archive
#[derive(Debug, Clone, Default)]
pub struct DebTranscoder {
    config: TranscodeConfig,
    tar: TarTranscoder,
}

impl DebTranscoder {
    /// Creates a transcoder with default configuration and rewriter
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcoder with custom configuration
    pub fn with_config(config: TranscodeConfig) -> Self {
        Self {
            config,
            tar: TarTranscoder::new(),
        }
    }

    /// Creates a transcoder with a custom rewriter
    pub fn with_rewriter(rewriter: Rewriter) -> Self {
        Self {
            config: TranscodeConfig::default(),
            tar: TarTranscoder::with_rewriter(rewriter),
        }
    }

    /// Rewrites the package on `input` into a new package on `output`.
    ///
    /// Members are processed in strict input order; the operation is
    /// all-or-nothing, and a failure in any member aborts the whole run.
    /// Partial output is the caller's to clean up.
    pub fn transcode<R: Read, W: Write>(&self, input: R, output: W) -> Result<()> {
        let mut archive = ar::Archive::new(input);
        let mut builder = ar::Builder::new(output);

        while let Some(entry) = archive.next_entry() {
            let mut entry = entry.map_err(Error::ar_header_read)?;
            let src = entry.header().clone();
            let name = String::from_utf8_lossy(src.identifier()).into_owned();

            let mut buf = Vec::new();
            let identifier = if trim_gnu_terminator(src.identifier())
                == self.config.data_member.as_bytes()
            {
                debug!("transcoding compressed data member '{}'", name);
                let mut tar_bytes = Vec::new();
                XzDecoder::new(&mut entry)
                    .read_to_end(&mut tar_bytes)
                    .map_err(Error::decompress)?;
                self.tar.transcode(tar_bytes.as_slice(), &mut buf)?;
                self.config.rewritten_member.clone().into_bytes()
            } else {
                debug!("unknown member '{}', leaving as is", name);
                entry
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::ar_member_read(name.as_str(), e))?;
                src.identifier().to_vec()
            };

            // The size field precedes the payload, so it must reflect the
            // buffered post-transform length
            let mut header = ar::Header::new(identifier, buf.len() as u64);
            header.set_mode(src.mode());
            header.set_mtime(src.mtime());
            header.set_uid(src.uid());
            header.set_gid(src.gid());
            builder
                .append(&header, buf.as_slice())
                .map_err(|e| Error::ar_write(name.as_str(), e))?;
        }

        Ok(())
    }
}

/// Strip the trailing `/` GNU-style archives terminate identifiers with
fn trim_gnu_terminator(identifier: &[u8]) -> &[u8] {
    identifier.strip_suffix(b"/").unwrap_or(identifier)
}

/// Rewrite a package file on disk
///
/// This is a convenience function that opens `input`, transcodes it with the
/// default configuration and writes the result to `output`.
pub fn transcode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    transcode_file_with_config(input, output, TranscodeConfig::default())
}

/// Rewrite a package file on disk with custom configuration
pub fn transcode_file_with_config(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: TranscodeConfig,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let reader = std::fs::File::open(input).map_err(|e| Error::file_read(input, e))?;
    let writer = std::fs::File::create(output).map_err(|e| Error::file_write(output, e))?;
    let mut writer = BufWriter::new(writer);
    DebTranscoder::with_config(config).transcode(BufReader::new(reader), &mut writer)?;
    writer.flush().map_err(|e| Error::file_write(output, e))
}

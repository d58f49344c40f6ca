//! Byte pattern rewriting.
//!
//! This module implements the literal substring replacement applied to tar
//! entry names and payload bytes throughout the package pipeline.
//!
//! ## Algorithm Overview
//!
//! 1. Scan the input left-to-right for the `from` pattern
//! 2. Copy the unmatched prefix, emit `to`, resume after the match
//! 3. Matches are non-overlapping; each one consumes the full pattern
//! 4. Input without a match is returned unchanged
//!
//! ## Example
//!
//! ```
//! use rebrand_core::rewrite::{Rewrite, Rewriter};
//!
//! let rewriter = Rewriter::new();
//! let out = rewriter.rewrite(b"#!/data/data/com.termux/files/usr/bin/sh");
//! assert_eq!(out, b"#!/data/data/com.octo4a/files/usr/bin/sh");
//! ```
//!
//! ## Extensibility
//!
//! The [`Rewrite`] trait allows custom replacement strategies:
//!
//! ```
//! use rebrand_core::rewrite::Rewrite;
//!
//! struct Upper;
//!
//! impl Rewrite for Upper {
//!     fn rewrite(&self, data: &[u8]) -> Vec<u8> {
//!         data.to_ascii_uppercase()
//!     }
//! }
//! ```

use crate::{DEFAULT_FROM, DEFAULT_TO};
use std::io::{Read, Write};
use tracing::debug;

/// The `(from, to)` byte patterns driving every replacement.
///
/// The pair is injected into each component at construction; the two
/// patterns may differ in length, so transformed sizes are always
/// recomputed rather than assumed equal to the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPair {
    /// Pattern searched for in names and payloads
    pub from: Vec<u8>,
    /// Replacement emitted for every occurrence
    pub to: Vec<u8>,
}

impl Default for PatternPair {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM.to_vec(),
            to: DEFAULT_TO.to_vec(),
        }
    }
}

impl PatternPair {
    /// Creates a pattern pair from arbitrary byte sequences
    pub fn new(from: impl Into<Vec<u8>>, to: impl Into<Vec<u8>>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Trait for implementing custom rewrite strategies
///
/// The transcoders only depend on this trait, so alternative replacement
/// logic can be plugged in without touching the archive layers.
pub trait Rewrite {
    /// Replace every non-overlapping occurrence of the pattern in `data`,
    /// returning the rewritten bytes
    fn rewrite(&self, data: &[u8]) -> Vec<u8>;

    /// Rewrite the remaining bytes of `reader` into `writer`.
    ///
    /// The input is buffered in full before replacement; read and write
    /// failures propagate unchanged. Returns the number of bytes written.
    fn rewrite_stream(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> std::io::Result<u64> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let out = self.rewrite(&data);
        writer.write_all(&out)?;
        debug!("rewrote {} input bytes into {} output bytes", data.len(), out.len());
        Ok(out.len() as u64)
    }
}

/// Primary rewriter performing literal pattern replacement
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    patterns: PatternPair,
}

impl Rewriter {
    /// Creates a rewriter with the default pattern pair
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rewriter with a custom pattern pair
    pub fn with_patterns(patterns: PatternPair) -> Self {
        Self { patterns }
    }

    /// Returns the pattern pair in use
    pub fn patterns(&self) -> &PatternPair {
        &self.patterns
    }
}

impl Rewrite for Rewriter {
    fn rewrite(&self, data: &[u8]) -> Vec<u8> {
        let from = self.patterns.from.as_slice();
        let to = self.patterns.to.as_slice();

        // Identity fast path: the common member carries no occurrence at all
        if from.is_empty() || find_subsequence(data, from).is_none() {
            return data.to_vec();
        }

        let mut out = Vec::with_capacity(data.len());
        let mut rest = data;
        while let Some(pos) = find_subsequence(rest, from) {
            out.extend_from_slice(&rest[..pos]);
            out.extend_from_slice(to);
            rest = &rest[pos + from.len()..];
        }
        out.extend_from_slice(rest);
        out
    }
}

/// Find a subsequence within a byte slice
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

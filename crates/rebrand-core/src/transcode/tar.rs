//! Embedded tar stream transcoding.
//!
//! This module rewrites a tar stream entry by entry: every entry name goes
//! through the rewriter, and every nonzero payload is buffered, rewritten and
//! re-emitted with its size field corrected to the rewritten length.
//!
//! Because the replacement patterns may differ in length, the header is only
//! written once the rewritten payload is known. Relying on equal pattern
//! lengths would silently corrupt the stream the day the patterns change.
//!
//! Entries are emitted in exactly the order they are read. Link targets,
//! modes, timestamps and ownership pass through unchanged from the source
//! header.

use crate::error::{Error, Result};
use crate::rewrite::{Rewrite, Rewriter};
use std::io::{Read, Write};
use std::path::Path;
use tracing::trace;

/// Transcoder for the embedded tar stream
#[derive(Debug, Clone, Default)]
pub struct TarTranscoder {
    rewriter: Rewriter,
}

impl TarTranscoder {
    /// Creates a transcoder with the default rewriter
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcoder with a custom rewriter
    pub fn with_rewriter(rewriter: Rewriter) -> Self {
        Self { rewriter }
    }

    /// Rewrites the tar stream in `input` into a new tar stream on `output`.
    ///
    /// Consumes entries until end-of-archive, then finalizes the output
    /// stream. Any header read, payload copy or write failure aborts the
    /// whole transcode.
    pub fn transcode<R: Read, W: Write>(&self, input: R, output: W) -> Result<()> {
        let mut archive = tar::Archive::new(input);
        let mut builder = tar::Builder::new(output);

        let entries = archive.entries().map_err(Error::tar_header_read)?;
        for entry in entries {
            let mut entry = entry.map_err(Error::tar_header_read)?;
            let mut header = entry.header().clone();

            let raw_name = entry.path_bytes().into_owned();
            let name = String::from_utf8(self.rewriter.rewrite(&raw_name))
                .map_err(|e| Error::invalid_member_name(e.as_bytes()))?;
            let size = header.entry_size().map_err(Error::tar_header_read)?;
            trace!("entry '{}', size {}", name, size);

            if size > 0 {
                let mut payload = Vec::with_capacity(size as usize);
                entry
                    .read_to_end(&mut payload)
                    .map_err(|e| Error::tar_payload_read(name.as_str(), e))?;
                let payload = self.rewriter.rewrite(&payload);
                header.set_size(payload.len() as u64);
                builder
                    .append_data(&mut header, Path::new(&name), payload.as_slice())
                    .map_err(|e| Error::tar_write(name.as_str(), e))?;
            } else if let Some(target) = entry.link_name_bytes() {
                // Link targets are passed through verbatim, only the entry
                // name is rewritten
                let target = std::str::from_utf8(&target)
                    .map_err(|_| Error::invalid_member_name(&target))?
                    .to_owned();
                builder
                    .append_link(&mut header, Path::new(&name), Path::new(&target))
                    .map_err(|e| Error::tar_write(name.as_str(), e))?;
            } else {
                builder
                    .append_data(&mut header, Path::new(&name), std::io::empty())
                    .map_err(|e| Error::tar_write(name.as_str(), e))?;
            }
        }

        builder.finish().map_err(Error::tar_finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::PatternPair;
    use std::io::Read;

    fn file_entry(builder: &mut tar::Builder<Vec<u8>>, path: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_600_000_000);
        builder.append_data(&mut header, path, data).unwrap();
    }

    fn dir_entry(builder: &mut tar::Builder<Vec<u8>>, path: &str) {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::dir());
        header.set_size(0);
        header.set_mode(0o755);
        builder.append_data(&mut header, path, std::io::empty()).unwrap();
    }

    fn collect(data: &[u8]) -> Vec<(String, Vec<u8>, u64)> {
        let mut archive = tar::Archive::new(data);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = String::from_utf8(entry.path_bytes().into_owned()).unwrap();
                let size = entry.header().entry_size().unwrap();
                let mut payload = Vec::new();
                entry.read_to_end(&mut payload).unwrap();
                (name, payload, size)
            })
            .collect()
    }

    #[test]
    fn test_names_and_payloads_rewritten() {
        let mut builder = tar::Builder::new(Vec::new());
        file_entry(
            &mut builder,
            "usr/com.termux/bin/sh",
            b"#!/data/com.termux/bin/sh\n",
        );
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let entries = collect(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "usr/com.octo4a/bin/sh");
        assert_eq!(entries[0].1, b"#!/data/com.octo4a/bin/sh\n");
        assert_eq!(entries[0].2, entries[0].1.len() as u64);
    }

    #[test]
    fn test_round_trip_without_matches() {
        let mut builder = tar::Builder::new(Vec::new());
        dir_entry(&mut builder, "usr/share/doc");
        file_entry(&mut builder, "usr/share/doc/README", b"plain contents\n");
        file_entry(&mut builder, "usr/bin/true", &[0x7f, b'E', b'L', b'F', 0x00]);
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        assert_eq!(collect(&input), collect(&output));
    }

    #[test]
    fn test_order_preserved() {
        let mut builder = tar::Builder::new(Vec::new());
        for name in ["c", "a", "b"] {
            file_entry(&mut builder, name, b"x");
        }
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let names: Vec<String> = collect(&output).into_iter().map(|(n, _, _)| n).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_directory_entry_has_no_payload_step() {
        let mut builder = tar::Builder::new(Vec::new());
        dir_entry(&mut builder, "data/data/com.termux/files");
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let entries = collect(&output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "data/data/com.octo4a/files");
        assert_eq!(entries[0].1, Vec::<u8>::new());
        assert_eq!(entries[0].2, 0);
    }

    #[test]
    fn test_symlink_target_passes_through() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::symlink());
        header.set_size(0);
        builder
            .append_link(
                &mut header,
                "usr/com.termux/bin/login",
                "/data/data/com.termux/files/usr/bin/sh",
            )
            .unwrap();
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let mut archive = tar::Archive::new(output.as_slice());
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(
            entry.path_bytes().as_ref(),
            b"usr/com.octo4a/bin/login".as_slice()
        );
        assert_eq!(
            entry.link_name_bytes().unwrap().as_ref(),
            b"/data/data/com.termux/files/usr/bin/sh".as_slice()
        );
    }

    #[test]
    fn test_size_corrected_for_unequal_patterns() {
        let rewriter = Rewriter::with_patterns(PatternPair::new(
            b"com.termux".as_slice(),
            b"org.example.longer".as_slice(),
        ));
        let mut builder = tar::Builder::new(Vec::new());
        file_entry(&mut builder, "etc/profile", b"export PREFIX=/data/data/com.termux\n");
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::with_rewriter(rewriter)
            .transcode(input.as_slice(), &mut output)
            .unwrap();

        let entries = collect(&output);
        let expected = b"export PREFIX=/data/data/org.example.longer\n";
        assert_eq!(entries[0].1, expected);
        assert_eq!(entries[0].2, expected.len() as u64);
    }

    #[test]
    fn test_long_name_round_trips() {
        let long_dir = "data/data/com.termux/files/usr/share/a-rather-deeply/nested/directory/tree/that-overflows/the-classic-header-name-field";
        let path = format!("{}/file.txt", long_dir);
        assert!(path.len() > 100);

        let mut builder = tar::Builder::new(Vec::new());
        file_entry(&mut builder, &path, b"payload");
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let entries = collect(&output);
        assert_eq!(entries[0].0, path.replace("com.termux", "com.octo4a"));
        assert_eq!(entries[0].1, b"payload");
    }

    #[test]
    fn test_truncated_stream_errors() {
        let mut builder = tar::Builder::new(Vec::new());
        file_entry(&mut builder, "usr/bin/sh", b"#!/bin/sh\n");
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        let err = TarTranscoder::new()
            .transcode(&input[..300], &mut output)
            .unwrap_err();
        assert!(matches!(err, Error::TarHeaderRead { .. }));
    }

    #[test]
    fn test_metadata_passes_through() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o750);
        header.set_mtime(1_234_567_890);
        header.set_uid(1000);
        header.set_gid(1000);
        builder.append_data(&mut header, "usr/bin/tool", &b"hello"[..]).unwrap();
        let input = builder.into_inner().unwrap();

        let mut output = Vec::new();
        TarTranscoder::new().transcode(input.as_slice(), &mut output).unwrap();

        let mut archive = tar::Archive::new(output.as_slice());
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        let header = entry.header();
        assert_eq!(header.mode().unwrap(), 0o750);
        assert_eq!(header.mtime().unwrap(), 1_234_567_890);
        assert_eq!(header.uid().unwrap(), 1000);
        assert_eq!(header.gid().unwrap(), 1000);
    }
}

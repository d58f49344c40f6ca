//! rebrand - Rewrite embedded application identifiers inside Debian packages
//!
//! This tool rewrites a Debian package's embedded data tar stream so that
//! every occurrence of the upstream application identifier is replaced, and
//! can also rewrite a directory tree in place after extraction.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use rebrand_core::transcode::transcode_file;
use rebrand_core::{Rewrite, Rewriter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Rewrite embedded application identifiers inside Debian packages
#[derive(Parser, Debug)]
#[command(name = "rebrand")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output path for the rewritten package (defaults to `<input>.replaced`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a Debian package to rewrite
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory tree to rewrite in place
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Statistics for a directory tree rewrite
#[derive(Default)]
struct TreeStats {
    files_seen: usize,
    files_changed: usize,
}

impl TreeStats {
    fn print_summary(&self) {
        info!(
            "Summary: {} files inspected, {} rewritten",
            self.files_seen, self.files_changed
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_package(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Derive the default output path by appending `.replaced` to the input name
fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".replaced");
    PathBuf::from(name)
}

/// Rewrite a single Debian package
fn process_package(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(file));

    info!("Rewriting package: {}", file.display());
    transcode_file(file, &output)
        .with_context(|| format!("failed to rewrite package: {}", file.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}

/// Rewrite every regular file under a directory tree in place
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }
    if cli.output.is_some() {
        warn!("--output is ignored in directory mode");
    }

    info!("Rewriting tree: {}", directory.display());

    let stats = rewrite_tree(directory, &Rewriter::new())?;
    stats.print_summary();

    Ok(())
}

/// Walk `directory` and rewrite the pattern in place in every regular file,
/// preserving each file's permission mode
fn rewrite_tree(directory: &Path, rewriter: &Rewriter) -> Result<TreeStats> {
    let mut stats = TreeStats::default();

    for entry in WalkDir::new(directory).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", directory.display()))?;
        let path = entry.path();

        // Only regular files carry rewritable content
        if !entry.file_type().is_file() {
            trace!("Skipping non-regular file: {}", path.display());
            continue;
        }

        stats.files_seen += 1;
        let data =
            fs::read(path).with_context(|| format!("failed to read file {}", path.display()))?;
        let rewritten = rewriter.rewrite(&data);
        if rewritten == data {
            trace!("No occurrences in {}", path.display());
            continue;
        }

        let permissions = fs::metadata(path)
            .with_context(|| format!("failed to stat file {}", path.display()))?
            .permissions();
        fs::write(path, &rewritten)
            .with_context(|| format!("failed to write file {}", path.display()))?;
        fs::set_permissions(path, permissions)
            .with_context(|| format!("failed to restore permissions on {}", path.display()))?;

        debug!("Rewrote {}", path.display());
        stats.files_changed += 1;
    }

    Ok(stats)
}

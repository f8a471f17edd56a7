use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::sevenz::ReaderConfig;

/// Environment fallback for `--sevenz`.
pub const ENV_SEVENZ: &str = "ISOREPO_7Z";
/// Environment fallback for `--read-limit`.
pub const ENV_READ_LIMIT: &str = "ISOREPO_READ_LIMIT";
/// Environment fallback for `--timeout-secs`.
pub const ENV_TIMEOUT_SECS: &str = "ISOREPO_TIMEOUT_SECS";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the 7z executable. Searched for in PATH and the 7-Zip install folders if not given.
    #[arg(long, global = true)]
    pub sevenz: Option<PathBuf>,

    /// Maximum number of files extracted at the same time. [default: number of CPUs]
    #[arg(long, global = true)]
    pub read_limit: Option<usize>,

    /// Kill any 7z invocation that runs longer than this many seconds. [default: no limit]
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Log filter (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to look for images.
#[derive(ClapArgs, Clone, Debug)]
pub struct ImageSource {
    /// Root directory searched recursively for .iso and .tar images. Defaults to the current directory.
    #[arg(long, conflicts_with = "iso")]
    pub dir: Option<PathBuf>,

    /// A single image to publish.
    #[arg(long)]
    pub iso: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Open every image and print the repository descriptor of each repository found.
    Scan {
        #[command(flatten)]
        source: ImageSource,
    },

    /// Print a sources.list for all repositories with the given host substituted.
    Sources {
        #[command(flatten)]
        source: ImageSource,

        /// Host (and optional :port) clients use to reach this server.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List a directory inside an image, or show a file's metadata.
    #[command(alias = "l")]
    Ls {
        /// The image to browse.
        #[arg(required = true)]
        archive: PathBuf,

        /// Slash separated path inside the image. Empty for the root.
        #[arg(default_value = "")]
        path: String,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Write one file from an image to standard output.
    Cat {
        /// The image to read from.
        #[arg(required = true)]
        archive: PathBuf,

        /// Slash separated path of the file inside the image.
        path: String,
    },
}

/// Returns the flag value, else the parsed environment variable, else `None`.
pub fn flag_or_env<T: FromStr>(flag: Option<T>, var: &str) -> Result<Option<T>, String> {
    if flag.is_some() {
        return Ok(flag);
    }
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid value '{}' in {}", raw, var)),
        _ => Ok(None),
    }
}

/// Builds the 7z settings from flags and their environment fallbacks.
///
/// Priority:
/// 1. command-line flag.
/// 2. `ISOREPO_*` environment variable.
/// 3. [`ReaderConfig::default`].
pub fn reader_config(args: &Args) -> Result<ReaderConfig, String> {
    let defaults = ReaderConfig::default();
    Ok(ReaderConfig {
        tool: flag_or_env(args.sevenz.clone(), ENV_SEVENZ)?,
        read_permits: flag_or_env(args.read_limit, ENV_READ_LIMIT)?.unwrap_or(defaults.read_permits),
        timeout: flag_or_env(args.timeout_secs, ENV_TIMEOUT_SECS)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
    })
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}

//! # isorepo Core Library
//!
//! Publishes the contents of ISO and TAR images as a read-only virtual filesystem and
//! recognizes images that carry a Debian package repository, so they can be offered to
//! `apt` clients under a rewritten address.
//!
//! All archive access goes through the external `7z` tool; nothing is unpacked to disk.
//!
//! ## Key Modules
//!
//! - [`listing`]: tokenizer for the `7z l` technical listing.
//! - [`tree`]: arena file tree and path resolution.
//! - [`repo`]: repository detection and the `deb` source descriptor.
//! - [`sevenz`]: subprocess bridge to `7z` with a read limiter and optional timeouts.
//! - [`archive`]: one opened image, the entry point for lookups and reads.
//! - [`catalog`]: the set of published repositories and the `sources.list` rendering.
//!
//! ## Examples
//!
//! ```no_run
//! use std::path::Path;
//! use isorepo::archive::Archive;
//! use isorepo::sevenz::{ReaderConfig, SevenZ, VersionNotifier};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sevenz = SevenZ::new(ReaderConfig::default())?;
//! let archive = Archive::open(Path::new("astra.iso"), &sevenz, &VersionNotifier::new())?;
//! if let Some(repo) = archive.repo() {
//!     println!("{}", repo.with_host("192.168.1.10:4309"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod discover;
pub mod error;
pub mod listing;
pub mod repo;
pub mod sevenz;
pub mod tree;

pub use error::IsoRepoError;

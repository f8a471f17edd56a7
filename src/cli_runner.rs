//! Command dispatch for the `isorepo` binary.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::archive::Archive;
use crate::catalog::Catalog;
use crate::cli::{self, Args, Commands, ImageSource};
use crate::common::Entry;
use crate::discover;
use crate::error::IsoRepoError;
use crate::sevenz::{SevenZ, VersionNotifier};
use crate::tree::Lookup;

/// Installs the stderr log subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Public entry for running CLI logic.
pub fn run_cli_app() -> Result<(), Box<dyn Error>> {
    let args = cli::run();
    init_tracing(&args.log_level);
    run_with(args)
}

pub fn run_with(args: Args) -> Result<(), Box<dyn Error>> {
    let config = cli::reader_config(&args)?;
    let sevenz = SevenZ::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Commands::Scan { source } => {
            let catalog = Catalog::open_all(&image_paths(source)?, &sevenz);
            for archive in catalog.archives() {
                if let Some(repo) = archive.repo() {
                    writeln!(out, "{}", repo)?;
                }
            }
        }
        Commands::Sources { source, host } => {
            let catalog = Catalog::open_all(&image_paths(source)?, &sevenz);
            let list = catalog.sources_list(host);
            if !list.is_empty() {
                writeln!(out, "{}", list)?;
            }
        }
        Commands::Ls { archive, path, json } => {
            let archive = Archive::browse(archive, &sevenz, &VersionNotifier::new())?;
            match archive.read_path(path)? {
                Lookup::File(entry) => {
                    if *json {
                        serde_json::to_writer_pretty(&mut out, entry)?;
                        writeln!(out)?;
                    } else {
                        writeln!(out, "{}", format_entry(entry))?;
                    }
                }
                Lookup::Dir(entries) => {
                    if *json {
                        serde_json::to_writer_pretty(&mut out, &entries)?;
                        writeln!(out)?;
                    } else {
                        for entry in entries {
                            writeln!(out, "{}", format_entry(entry))?;
                        }
                    }
                }
            }
        }
        Commands::Cat { archive, path } => {
            let archive = Archive::browse(archive, &sevenz, &VersionNotifier::new())?;
            match archive.read_path(path)? {
                Lookup::File(_) => archive.read_file(path, &mut out)?,
                Lookup::Dir(_) => return Err(format!("'{}' is a directory", path).into()),
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn image_paths(source: &ImageSource) -> Result<Vec<PathBuf>, IsoRepoError> {
    if let Some(iso) = &source.iso {
        if !iso.is_file() {
            return Err(IsoRepoError::Io {
                source: io::Error::new(io::ErrorKind::NotFound, "image not found"),
                path: iso.clone(),
            });
        }
        return Ok(vec![iso.clone()]);
    }
    let root = match &source.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let paths = discover::find_archives(&root)?;
    if paths.is_empty() {
        tracing::warn!("no images found in '{}'", root.display());
    }
    Ok(paths)
}

/// `2018-06-20 20:32:10         5188  name` for files, `<DIR>` and a trailing slash for directories.
pub fn format_entry(entry: &Entry) -> String {
    let size = match entry.size {
        _ if entry.is_dir => "<DIR>".to_string(),
        Some(size) => size.to_string(),
        None => "-".to_string(),
    };
    let slash = if entry.is_dir { "/" } else { "" };
    format!("{}  {:>12}  {}{}", entry.created_at, size, entry.name, slash)
}

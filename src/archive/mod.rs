//! # Archive Handle
//!
//! One [`Archive`] per ISO/TAR image: the parsed file tree, the path prefix needed to talk
//! to 7z about it, and the repository descriptor. Built once at startup and read-only
//! afterwards, so a shared `&Archive` can serve any number of concurrent lookups.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{IsoRepoError, Result};
use crate::listing::ListingParser;
use crate::repo::{self, ContentSource, RepoSource};
use crate::sevenz::{SevenZ, VersionNotifier};
use crate::tree::{FileTree, Lookup};

#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    name: String,
    tree: FileTree,
    /// `""` for ISO images, `./` (or `.\`) for TAR archives.
    prefix: String,
    repo: Option<RepoSource>,
    sevenz: SevenZ,
}

/// Parses a full `7z l` listing into a tree. Returns the tree and the path prefix.
pub fn build_tree(listing: &str) -> (FileTree, String) {
    let mut parser = ListingParser::new();
    let mut tree = FileTree::new();
    for line in listing.lines() {
        if let Some(chain) = parser.parse_line(line) {
            tree.insert(&chain);
        }
    }
    (tree, parser.path_prefix().to_string())
}

impl Archive {
    /// Opens a repository image.
    ///
    /// Fails with [`IsoRepoError::NotRepository`] when the image has no repository
    /// layout; callers publishing a catalog should skip such images quietly.
    pub fn open(path: &Path, sevenz: &SevenZ, notifier: &VersionNotifier) -> Result<Self> {
        let mut archive = Self::browse(path, sevenz, notifier)?;
        let repo = repo::detect(&archive.tree, &archive, &archive.name)?;
        info!("{}: {}", archive.name, repo);
        archive.repo = Some(repo);
        Ok(archive)
    }

    /// Reads the tree of any image without looking for a repository.
    pub fn browse(path: &Path, sevenz: &SevenZ, notifier: &VersionNotifier) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| IsoRepoError::from(e).at_path(path))?;
        if !meta.is_file() {
            return Err(IsoRepoError::Io {
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
                path: path.to_path_buf(),
            });
        }

        notifier.check(sevenz.version());

        let listing = sevenz.list(path)?;
        let (tree, prefix) = build_tree(&listing);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("{}: {} nodes, prefix '{}'", name, tree.len(), prefix);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            tree,
            prefix,
            repo: None,
            sevenz: sevenz.clone(),
        })
    }

    /// File name of the image, as used in `/repo/<name>/` URLs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn repo(&self) -> Option<&RepoSource> {
        self.repo.as_ref()
    }

    /// File metadata or a sorted listing for `path` (`""` is the root).
    pub fn read_path(&self, path: &str) -> Result<Lookup<'_>> {
        self.tree.lookup(path).map_err(|e| {
            debug!("{}: {}", self.name, e);
            e
        })
    }

    /// Streams the file at `path` into `out`.
    pub fn read_file(&self, path: &str, out: &mut dyn Write) -> Result<()> {
        self.sevenz.read_file(&self.path, &self.prefix, path, out)
    }
}

impl ContentSource for Archive {
    fn read_file(&self, path: &str, out: &mut dyn Write) -> Result<()> {
        Archive::read_file(self, path, out)
    }
}

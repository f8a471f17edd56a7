//! The set of published repositories.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::archive::Archive;
use crate::error::IsoRepoError;
use crate::sevenz::{SevenZ, VersionNotifier};

#[derive(Debug, Default)]
pub struct Catalog {
    archives: Vec<Archive>,
}

impl Catalog {
    /// Opens every image in order and keeps the repositories.
    ///
    /// Plain images are dropped at info level; any other failure is logged as a warning
    /// and that image is excluded.
    pub fn open_all(paths: &[PathBuf], sevenz: &SevenZ) -> Self {
        let notifier = VersionNotifier::new();
        let mut archives = Vec::with_capacity(paths.len());

        for path in paths {
            match Archive::open(path, sevenz, &notifier) {
                Ok(archive) => archives.push(archive),
                Err(IsoRepoError::NotRepository) => {
                    info!("'{}' is not a repository, skipped", path.display());
                }
                Err(e) => warn!("could not open '{}': {}", path.display(), e),
            }
        }

        if archives.is_empty() && !paths.is_empty() {
            warn!("none of the {} images contains a repository", paths.len());
        }
        Self { archives }
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Finds an archive by its file name.
    pub fn get(&self, name: &str) -> Option<&Archive> {
        self.archives.iter().find(|a| a.name() == name)
    }

    /// One `deb [arch=amd64] http://<host>/repo/...` line per repository.
    pub fn sources_list(&self, host: &str) -> String {
        self.archives
            .iter()
            .filter_map(Archive::repo)
            .map(|repo| repo.with_host(host).replacen("deb ", "deb [arch=amd64] ", 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

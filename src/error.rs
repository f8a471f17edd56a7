use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `isorepo` crate.
#[derive(Debug, Error)]
pub enum IsoRepoError {
    /// One of the repository markers (`dists`, a distribution directory, the `Release`
    /// file) is missing. The archive is a plain image, not a repository.
    #[error("archive is not a package repository")]
    NotRepository,

    /// The markers are present but the `Release` file has no usable `Components:` line.
    #[error("malformed repository: {0}")]
    MalformedRepository(String),

    /// A lookup through the file tree failed on some segment.
    #[error("path not found: '{0}'")]
    PathNotFound(String),

    /// The external tool exited with a nonzero code and produced nothing usable.
    /// `code` is -1 when the process was terminated by a signal.
    #[error("'{command}' failed with exit code {code}")]
    ProcessFailure { command: String, code: i32 },

    /// The external tool did not finish before the configured deadline and was killed.
    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// The 7-Zip executable could not be located.
    #[error("7z executable not found (looked in PATH and the 7-Zip install directories)")]
    ToolNotFound,

    /// An I/O error occurred, typically while stat'ing an archive or talking to a subprocess.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { source: std::io::Error, path: PathBuf },
}

impl IsoRepoError {
    /// Attaches a path to a path-less `Io` error produced by the `From` conversion.
    pub fn at_path(self, at: impl Into<PathBuf>) -> Self {
        match self {
            IsoRepoError::Io { source, path } if path.as_os_str().is_empty() => {
                IsoRepoError::Io { source, path: at.into() }
            }
            other => other,
        }
    }
}

// Generic IO error conversion that doesn't require a path
impl From<std::io::Error> for IsoRepoError {
    fn from(err: std::io::Error) -> Self {
        IsoRepoError::Io { source: err, path: PathBuf::new() }
    }
}

pub type Result<T, E = IsoRepoError> = std::result::Result<T, E>;

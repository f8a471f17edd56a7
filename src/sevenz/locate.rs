//! Locating the 7-Zip executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{IsoRepoError, Result};

const SEVENZ_FOLDER: &str = "7-Zip";

#[cfg(windows)]
pub const SEVENZ_BIN: &str = "7z.exe";
#[cfg(not(windows))]
pub const SEVENZ_BIN: &str = "7z";

/// Looks for `7z` in every `PATH` entry, then in the 7-Zip install folder under
/// `%ProgramFiles%` and `%ProgramFiles(x86)%`.
pub fn find_7z() -> Result<PathBuf> {
    let program_files = [std::env::var_os("ProgramFiles"), std::env::var_os("ProgramFiles(x86)")];
    find_in(std::env::var_os("PATH"), &program_files).ok_or(IsoRepoError::ToolNotFound)
}

/// Uses `configured` when given, otherwise searches the system.
pub fn resolve(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => {
            tracing::error!("configured 7z '{}' does not exist", path.display());
            Err(IsoRepoError::ToolNotFound)
        }
        None => find_7z(),
    }
}

pub(crate) fn find_in(path_var: Option<OsString>, program_files: &[Option<OsString>]) -> Option<PathBuf> {
    if let Some(paths) = path_var {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(SEVENZ_BIN);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    program_files
        .iter()
        .flatten()
        .filter(|root| !root.is_empty())
        .map(|root| Path::new(root).join(SEVENZ_FOLDER).join(SEVENZ_BIN))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_binary_on_path() {
        let empty = tempdir().unwrap();
        let bin_dir = tempdir().unwrap();
        fs::write(bin_dir.path().join(SEVENZ_BIN), b"").unwrap();

        let path_var = std::env::join_paths([empty.path(), bin_dir.path()]).unwrap();
        assert_eq!(find_in(Some(path_var), &[]), Some(bin_dir.path().join(SEVENZ_BIN)));
    }

    #[test]
    fn falls_back_to_program_files() {
        let pf = tempdir().unwrap();
        fs::create_dir(pf.path().join(SEVENZ_FOLDER)).unwrap();
        fs::write(pf.path().join(SEVENZ_FOLDER).join(SEVENZ_BIN), b"").unwrap();

        let found = find_in(None, &[None, Some(pf.path().as_os_str().to_owned())]);
        assert_eq!(found, Some(pf.path().join(SEVENZ_FOLDER).join(SEVENZ_BIN)));
    }

    #[test]
    fn nothing_found() {
        let empty = tempdir().unwrap();
        assert_eq!(find_in(Some(empty.path().as_os_str().to_owned()), &[Some(OsString::new())]), None);
    }

    #[test]
    fn configured_path_must_exist() {
        let dir = tempdir().unwrap();
        assert!(matches!(resolve(Some(&dir.path().join("missing-7z"))), Err(IsoRepoError::ToolNotFound)));
        let bin = dir.path().join("my7z");
        fs::write(&bin, b"").unwrap();
        assert_eq!(resolve(Some(&bin)).unwrap(), bin);
    }
}

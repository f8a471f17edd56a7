//! # Archive Reader
//!
//! Thin wrapper around the external `7z` executable. Nothing is linked in-process:
//! every listing, version query and extraction is a fresh subprocess.
//!
//! - `7z`                     banner with the version (see [`version`])
//! - `7z l <archive>`         technical listing, parsed by [`crate::listing`]
//! - `7z e <archive> -so <p>` one file's bytes on stdout

pub mod limiter;
pub mod locate;
mod process;
pub mod version;

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

pub use limiter::ReadLimiter;
pub use version::VersionNotifier;

use crate::error::{IsoRepoError, Result};

/// Settings for talking to the external tool.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Explicit path to the executable. Searched for when `None`.
    pub tool: Option<PathBuf>,
    /// Maximum number of concurrent extractions.
    pub read_permits: usize,
    /// Deadline for every subprocess. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { tool: None, read_permits: num_cpus::get(), timeout: None }
    }
}

#[derive(Debug, Clone)]
pub struct SevenZ {
    bin: PathBuf,
    version: String,
    limiter: ReadLimiter,
    timeout: Option<Duration>,
}

fn command_line(bin: &Path, args: &[&OsStr]) -> String {
    let mut line = bin.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

impl SevenZ {
    /// Locates the tool and reads its version.
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let bin = locate::resolve(config.tool.as_deref())?;
        let mut sevenz = Self {
            bin,
            version: version::UNKNOWN_VERSION.to_string(),
            limiter: ReadLimiter::new(config.read_permits),
            timeout: config.timeout,
        };
        let banner = sevenz.exec_once(&[])?;
        sevenz.version = version::parse_version(&banner);
        debug!("using {} version {}", sevenz.bin.display(), sevenz.version);
        Ok(sevenz)
    }

    /// `major.minor.0`, or `0.0.0` when the banner was not recognized.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn limiter(&self) -> &ReadLimiter {
        &self.limiter
    }

    /// Runs the tool once and returns stdout and stderr as one string.
    ///
    /// 7z sometimes exits nonzero while still printing a usable listing, so a failing exit
    /// with any output is returned as success. Only a silent failure is an error.
    pub fn exec_once(&self, args: &[&OsStr]) -> Result<String> {
        let line = command_line(&self.bin, args);
        debug!("exec - {}", line);

        let mut cmd = std::process::Command::new(&self.bin);
        cmd.args(args);
        let (finished, output) = process::run_captured(&mut cmd, self.timeout).map_err(|e| IsoRepoError::from(e).at_path(&self.bin))?;

        if finished.timed_out {
            return Err(self.timeout_error(line));
        }

        let text = String::from_utf8_lossy(&output).trim().to_string();
        if finished.status.success() {
            return Ok(text);
        }
        debug!("exec - exit code {}, captured {} bytes", finished.code(), text.len());
        if !text.is_empty() {
            return Ok(text);
        }
        Err(IsoRepoError::ProcessFailure { command: line, code: finished.code() })
    }

    /// `7z l <archive>`
    pub fn list(&self, archive: &Path) -> Result<String> {
        self.exec_once(&[OsStr::new("l"), archive.as_os_str()])
    }

    /// Streams one file of `archive` into `out`.
    ///
    /// `inner` is the slash separated path from the tree; `prefix` is the archive's path
    /// prefix and is put back in front of it. Waits for a permit from the limiter first.
    pub fn read_file(&self, archive: &Path, prefix: &str, inner: &str, out: &mut dyn Write) -> Result<()> {
        let file = format!("{}{}", prefix, inner.trim_start_matches('/'));
        let args = [OsStr::new("e"), archive.as_os_str(), OsStr::new("-so"), OsStr::new(&file)];
        let line = command_line(&self.bin, &args);

        let _permit = self.limiter.acquire();
        debug!("exec - {}", line);

        let mut cmd = std::process::Command::new(&self.bin);
        cmd.args(args);
        let (finished, copied, stderr) =
            process::run_streaming(&mut cmd, out, self.timeout).map_err(|e| IsoRepoError::from(e).at_path(archive))?;

        if finished.timed_out {
            return Err(self.timeout_error(line));
        }
        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            warn!("{} failed: {}", line, stderr.trim());
            return Err(IsoRepoError::ProcessFailure { command: line, code: finished.code() });
        }
        debug!("exec - streamed {} bytes", copied);
        Ok(())
    }

    fn timeout_error(&self, command: String) -> IsoRepoError {
        let secs = self.timeout.map(|t| t.as_secs()).unwrap_or(0);
        warn!("{} did not finish in {}s, killed", command, secs);
        IsoRepoError::Timeout { command, secs }
    }
}

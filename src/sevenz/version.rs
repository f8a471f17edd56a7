//! 7-Zip version detection and the once-per-process compatibility warnings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Returned when the banner could not be recognized.
pub const UNKNOWN_VERSION: &str = "0.0.0";

/// Major versions the listing format has been checked against.
pub const TESTED_MAJORS: std::ops::RangeInclusive<u32> = 16..=22;

/// `7-Zip 22.01 (x64)`.
static PLAIN_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z-]+\s+(\d+)\.(\d+)").expect("static regex"));
/// `7-Zip [64] 16.02`.
static BITNESS_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z-]+\s+\[\d+\]\s+(\d+)\.(\d+)").expect("static regex"));

/// Parses the banner printed by `7z` without arguments, e.g.
/// `7-Zip 22.01 (x64) : Copyright ...` or `7-Zip [64] 16.02 : Copyright ...`,
/// into `major.minor.0`. Anything else gives [`UNKNOWN_VERSION`].
pub fn parse_version(banner: &str) -> String {
    let Some(first) = banner.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return UNKNOWN_VERSION.to_string();
    };

    for re in [&*PLAIN_BANNER, &*BITNESS_BANNER] {
        if let Some(caps) = re.captures(first) {
            let major: u32 = caps[1].parse().unwrap_or(0);
            let minor: u32 = caps[2].parse().unwrap_or(0);
            return format!("{major}.{minor}.0");
        }
    }
    UNKNOWN_VERSION.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Tested,
    Untested,
    Unknown,
}

pub fn classify(version: &str) -> VersionStatus {
    if version == UNKNOWN_VERSION {
        return VersionStatus::Unknown;
    }
    match version.split('.').next().and_then(|m| m.parse::<u32>().ok()) {
        Some(major) if TESTED_MAJORS.contains(&major) => VersionStatus::Tested,
        Some(_) => VersionStatus::Untested,
        None => VersionStatus::Unknown,
    }
}

/// Emits each kind of version warning at most once over its lifetime.
///
/// Build one per run and hand it to every [`crate::archive::Archive::open`].
#[derive(Debug, Default)]
pub struct VersionNotifier {
    warned_unknown: AtomicBool,
    warned_untested: AtomicBool,
}

impl VersionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `version`, warning if this is the first problem of its kind.
    /// Returns `true` when a warning was emitted by this call.
    pub fn check(&self, version: &str) -> bool {
        match classify(version) {
            VersionStatus::Tested => false,
            VersionStatus::Unknown => {
                let first = !self.warned_unknown.swap(true, Ordering::Relaxed);
                if first {
                    warn!("could not determine the 7z version, results are not guaranteed");
                }
                first
            }
            VersionStatus::Untested => {
                let first = !self.warned_untested.swap(true, Ordering::Relaxed);
                if first {
                    warn!("7z version {} has not been tested, results are not guaranteed", version);
                }
                first
            }
        }
    }
}

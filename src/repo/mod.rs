//! # Repository Detector
//!
//! Recognizes the Debian repository layout inside an archive tree:
//!
//! ```text
//! dists/<distribution>/Release      (Components: main contrib ...)
//! dists/<distribution>/<component>/ (one directory per component)
//! ```
//!
//! and produces the `sources.list` line a client needs. The host part is left as the
//! `0.0.0.0` placeholder; the serving side substitutes a reachable address per request.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::error::{IsoRepoError, Result};
use crate::tree::FileTree;

pub const DISTS_DIR: &str = "dists";
pub const RELEASE_FILE: &str = "Release";
pub const PLACEHOLDER_HOST: &str = "0.0.0.0";

const COMPONENTS_KEY: &str = "components:";

/// Anything that can stream the content of a file inside the archive.
pub trait ContentSource {
    fn read_file(&self, path: &str, out: &mut dyn Write) -> Result<()>;
}

/// A detected repository, rendered via [`fmt::Display`] as a `deb` source line.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
    /// File name of the archive, used as the URL path component.
    pub archive_name: String,
    pub distribution: String,
    /// Sorted, deduplicated, each present as `dists/<distribution>/<component>/`.
    pub components: Vec<String>,
}

impl RepoSource {
    /// The source line with the placeholder host replaced by `host`
    /// (which may carry a `:port`).
    pub fn with_host(&self, host: &str) -> String {
        self.to_string()
            .replacen(&format!("http://{PLACEHOLDER_HOST}"), &format!("http://{host}"), 1)
    }
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deb http://{}/repo/{} {} {}",
            PLACEHOLDER_HOST,
            self.archive_name,
            self.distribution,
            self.components.join(" ")
        )
    }
}

/// Extracts the component names from the first `Components:` line of a Release file.
/// Empty names are dropped and duplicates keep their first position.
pub fn parse_components(release: &str) -> Vec<String> {
    let mut components: Vec<String> = Vec::new();
    let Some(line) = release
        .lines()
        .map(str::trim)
        .find(|l| {
            l.get(..COMPONENTS_KEY.len())
                .is_some_and(|key| key.eq_ignore_ascii_case(COMPONENTS_KEY))
        })
    else {
        return components;
    };

    let value = line[COMPONENTS_KEY.len()..].replace('\t', " ");
    for name in value.split(' ').map(str::trim).filter(|n| !n.is_empty()) {
        if !components.iter().any(|c| c == name) {
            components.push(name.to_string());
        }
    }
    components
}

/// Inspects `tree` for a repository and builds its source descriptor.
///
/// Missing markers yield [`IsoRepoError::NotRepository`]; a `Release` file whose
/// components do not resolve to directories yields [`IsoRepoError::MalformedRepository`].
pub fn detect(tree: &FileTree, source: &dyn ContentSource, archive_name: &str) -> Result<RepoSource> {
    let dists = tree.resolve_dir(DISTS_DIR).map_err(|_| IsoRepoError::NotRepository)?;

    // Last directory wins when several distributions are present.
    let (dist_id, distribution) = tree
        .children(dists)
        .filter(|(_, e)| e.is_dir)
        .last()
        .map(|(id, e)| (id, e.name.clone()))
        .ok_or(IsoRepoError::NotRepository)?;

    if !tree.children(dist_id).any(|(_, e)| !e.is_dir && e.name == RELEASE_FILE) {
        return Err(IsoRepoError::NotRepository);
    }
    let release_path = format!("{DISTS_DIR}/{distribution}/{RELEASE_FILE}");

    let mut buf = Vec::new();
    source.read_file(&release_path, &mut buf)?;
    let release = String::from_utf8_lossy(&buf);

    let mut components: Vec<String> = parse_components(&release)
        .into_iter()
        .filter(|c| {
            let found = tree.resolve_dir(&format!("{DISTS_DIR}/{distribution}/{c}")).is_ok();
            if !found {
                debug!("{}: component '{}' has no directory, dropped", archive_name, c);
            }
            found
        })
        .collect();

    if components.is_empty() {
        return Err(IsoRepoError::MalformedRepository(format!(
            "no usable '{COMPONENTS_KEY}' line in '{release_path}'"
        )));
    }
    components.sort();

    Ok(RepoSource {
        archive_name: archive_name.to_string(),
        distribution,
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Segment;
    use std::cell::Cell;

    struct StaticRelease {
        body: &'static str,
        reads: Cell<usize>,
    }

    impl StaticRelease {
        fn new(body: &'static str) -> Self {
            Self { body, reads: Cell::new(0) }
        }
    }

    impl ContentSource for StaticRelease {
        fn read_file(&self, path: &str, out: &mut dyn Write) -> Result<()> {
            assert!(path.ends_with("/Release"), "unexpected read of {path}");
            self.reads.set(self.reads.get() + 1);
            out.write_all(self.body.as_bytes())?;
            Ok(())
        }
    }

    fn repo_tree(dists: &[&str], components: &[&str]) -> FileTree {
        let mut tree = FileTree::new();
        tree.insert(&[Segment::dir("pool"), Segment::file("x.deb", 1)]);
        for dist in dists {
            tree.insert(&[Segment::dir("dists"), Segment::dir(*dist), Segment::file("Release", 100)]);
            for c in components {
                tree.insert(&[Segment::dir("dists"), Segment::dir(*dist), Segment::dir(*c)]);
            }
        }
        tree
    }

    #[test]
    fn builds_descriptor() {
        let tree = repo_tree(&["smolensk"], &["non-free", "main", "contrib"]);
        let release = StaticRelease::new("Origin: Astra\nComponents: main contrib non-free\nArchitectures: amd64\n");
        let repo = detect(&tree, &release, "astra.iso").unwrap();
        assert_eq!(repo.to_string(), "deb http://0.0.0.0/repo/astra.iso smolensk contrib main non-free");
        assert_eq!(release.reads.get(), 1);
    }

    #[test]
    fn components_without_directory_are_dropped() {
        let tree = repo_tree(&["stable"], &["main"]);
        let release = StaticRelease::new("Components: main contrib\n");
        let repo = detect(&tree, &release, "r.iso").unwrap();
        assert_eq!(repo.components, ["main"]);
    }

    #[test]
    fn missing_dists_is_not_repository() {
        let mut tree = FileTree::new();
        tree.insert(&[Segment::dir("boot"), Segment::file("vmlinuz", 1)]);
        let release = StaticRelease::new("");
        assert!(matches!(detect(&tree, &release, "a.iso"), Err(IsoRepoError::NotRepository)));
        assert_eq!(release.reads.get(), 0);
    }

    #[test]
    fn other_missing_markers_are_not_repository() {
        let release = StaticRelease::new("Components: main\n");

        let mut only_files = FileTree::new();
        only_files.insert(&[Segment::dir("dists"), Segment::file("README", 1)]);
        assert!(matches!(detect(&only_files, &release, "a.iso"), Err(IsoRepoError::NotRepository)));

        let mut no_release = FileTree::new();
        no_release.insert(&[Segment::dir("dists"), Segment::dir("stable"), Segment::dir("main")]);
        assert!(matches!(detect(&no_release, &release, "a.iso"), Err(IsoRepoError::NotRepository)));

        let mut dists_is_file = FileTree::new();
        dists_is_file.insert(&[Segment::file("dists", 1)]);
        assert!(matches!(detect(&dists_is_file, &release, "a.iso"), Err(IsoRepoError::NotRepository)));
    }

    #[test]
    fn no_usable_components_is_malformed() {
        let tree = repo_tree(&["stable"], &["main"]);
        for body in ["Origin: x\n", "Components: contrib\n", "Components:   \n"] {
            let release = StaticRelease::new(body);
            assert!(
                matches!(detect(&tree, &release, "a.iso"), Err(IsoRepoError::MalformedRepository(_))),
                "{body:?}"
            );
        }
    }

    #[test]
    fn release_directory_does_not_hide_release_file() {
        let mut tree = FileTree::new();
        tree.insert(&[Segment::dir("dists"), Segment::dir("stable"), Segment::dir("Release")]);
        tree.insert(&[Segment::dir("dists"), Segment::dir("stable"), Segment::file("Release", 20)]);
        tree.insert(&[Segment::dir("dists"), Segment::dir("stable"), Segment::dir("main")]);
        let release = StaticRelease::new("Components: main\n");
        let repo = detect(&tree, &release, "a.iso").unwrap();
        assert_eq!(repo.components, ["main"]);
        assert_eq!(release.reads.get(), 1);

        let mut only_dir = FileTree::new();
        only_dir.insert(&[Segment::dir("dists"), Segment::dir("stable"), Segment::dir("Release")]);
        assert!(matches!(detect(&only_dir, &release, "a.iso"), Err(IsoRepoError::NotRepository)));
    }

    // Only the last distribution directory is published.
    #[test]
    fn last_distribution_wins() {
        let tree = repo_tree(&["alpha", "beta"], &["main"]);
        let release = StaticRelease::new("Components: main\n");
        let repo = detect(&tree, &release, "a.iso").unwrap();
        assert_eq!(repo.distribution, "beta");
    }

    #[test]
    fn parses_components_line() {
        assert_eq!(
            parse_components("Suite: x\n  COMPONENTS:\tmain  main contrib\t\n"),
            ["main", "contrib"]
        );
        assert_eq!(parse_components("Components: a\nComponents: b\n"), ["a"]);
        assert!(parse_components("Codename: stable\n").is_empty());
    }

    #[test]
    fn host_substitution() {
        let repo = RepoSource {
            archive_name: "a.iso".into(),
            distribution: "stable".into(),
            components: vec!["main".into()],
        };
        assert_eq!(repo.with_host("10.0.0.5:4309"), "deb http://10.0.0.5:4309/repo/a.iso stable main");
    }
}

//! Path resolution against a [`FileTree`].

use super::FileTree;
use crate::common::{Entry, NodeId};
use crate::error::{IsoRepoError, Result};

/// Result of resolving a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    /// The path names a file; the caller should stream its content.
    File(&'a Entry),
    /// The path names a directory: directories first, then files, each sorted by name.
    Dir(Vec<&'a Entry>),
}

impl<'a> Lookup<'a> {
    pub fn file(&self) -> Option<&'a Entry> {
        match self {
            Lookup::File(entry) => Some(*entry),
            Lookup::Dir(_) => None,
        }
    }

    pub fn listing(&self) -> Option<&[&'a Entry]> {
        match self {
            Lookup::File(_) => None,
            Lookup::Dir(entries) => Some(entries.as_slice()),
        }
    }
}

fn normalize(path: &str) -> &str {
    path.trim().trim_matches('/')
}

impl FileTree {
    /// Walks all but the last segment, each of which must be a directory.
    fn walk_parents<'p>(&self, path: &'p str) -> Result<(NodeId, Option<&'p str>)> {
        let clean = normalize(path);
        if clean.is_empty() {
            return Ok((Self::ROOT, None));
        }

        let mut segments: Vec<&str> = clean.split('/').collect();
        let last = segments.pop();
        let mut level = Self::ROOT;
        for segment in segments {
            level = self
                .find_dir(level, segment)
                .ok_or_else(|| IsoRepoError::PathNotFound(path.to_string()))?;
        }
        Ok((level, last))
    }

    /// Resolves `path` (slash separated, relative to the root, `""` = root).
    pub fn lookup(&self, path: &str) -> Result<Lookup<'_>> {
        let (mut level, last) = self.walk_parents(path)?;

        if let Some(name) = last {
            let found = self
                .find_child(level, name)
                .ok_or_else(|| IsoRepoError::PathNotFound(path.to_string()))?;
            let entry = self.get(found);
            if !entry.is_dir {
                return Ok(Lookup::File(entry));
            }
            level = found;
        }

        Ok(Lookup::Dir(self.sorted_listing(level)))
    }

    /// Resolves `path` to a directory node. Files and missing paths are `PathNotFound`.
    pub fn resolve_dir(&self, path: &str) -> Result<NodeId> {
        let (level, last) = self.walk_parents(path)?;
        match last {
            None => Ok(level),
            Some(name) => self.find_dir(level, name).ok_or_else(|| IsoRepoError::PathNotFound(path.to_string())),
        }
    }

    /// Directories first, then files; each group ascending by byte-wise name.
    pub fn sorted_listing(&self, id: NodeId) -> Vec<&Entry> {
        let (mut dirs, mut files): (Vec<&Entry>, Vec<&Entry>) =
            self.children(id).map(|(_, e)| e).partition(|e| e.is_dir);
        dirs.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        files.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        dirs.extend(files);
        dirs
    }
}

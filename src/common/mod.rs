//! Common types shared by the listing parser, the tree and the resolver.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Index of an [`Entry`] inside a [`crate::tree::FileTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single file or directory node of an archive's file tree.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Entry {
    /// Timestamp reported by the listing. The Unix epoch when it could not be parsed.
    pub created_at: NaiveDateTime,
    pub is_dir: bool,
    /// Unpacked size in bytes. Always `None` for directories.
    pub size: Option<u64>,
    /// One path segment, never a full path.
    pub name: String,
    #[serde(skip)]
    pub is_root: bool,
    #[serde(skip)]
    pub(crate) children: Vec<NodeId>,
}

impl Entry {
    pub(crate) fn root() -> Self {
        Self {
            created_at: NaiveDateTime::default(),
            is_dir: true,
            size: None,
            name: String::new(),
            is_root: true,
            children: Vec::new(),
        }
    }

    pub(crate) fn from_segment(segment: &Segment) -> Self {
        Self {
            created_at: segment.created_at,
            is_dir: segment.is_dir,
            size: if segment.is_dir { None } else { segment.size },
            name: segment.name.clone(),
            is_root: false,
            children: Vec::new(),
        }
    }
}

/// One element of the chain inserted into the tree for a single listing line.
///
/// All but the last segment of a chain are synthetic directories; the last carries
/// the attributes reported for the listed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub created_at: NaiveDateTime,
}

impl Segment {
    /// A synthetic intermediate directory.
    pub fn dir(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_dir: true, size: None, created_at: NaiveDateTime::default() }
    }

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), is_dir: false, size: Some(size), created_at: NaiveDateTime::default() }
    }
}

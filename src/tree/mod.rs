//! # File Tree
//!
//! Arena-backed tree of [`Entry`] nodes built from the listing parser's segment chains.
//! Node 0 is always the synthetic root. Children are stored as [`NodeId`]s in insertion
//! order; nothing is removed once inserted.

mod resolve;

pub use resolve::Lookup;

use crate::common::{Entry, NodeId, Segment};

#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<Entry>,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self { nodes: vec![Entry::root()] }
    }

    pub fn root(&self) -> &Entry {
        &self.nodes[Self::ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> &Entry {
        &self.nodes[id.0]
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Entry)> + '_ {
        self.nodes[id.0].children.iter().map(move |&c| (c, &self.nodes[c.0]))
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Finds a directory child of `parent` by exact name.
    pub fn find_dir(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent).find(|(_, e)| e.is_dir && e.name == name).map(|(id, _)| id)
    }

    /// Finds the first child of `parent` with the given name, file or directory.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent).find(|(_, e)| e.name == name).map(|(id, _)| id)
    }

    /// Inserts one full path chain below the root.
    pub fn insert(&mut self, chain: &[Segment]) {
        self.insert_at(Self::ROOT, chain);
    }

    /// Recursive descent by segment position.
    ///
    /// Directory segments reuse an existing directory of the same name or create one.
    /// A file segment is always appended, even when a sibling of the same name exists.
    fn insert_at(&mut self, parent: NodeId, chain: &[Segment]) {
        let Some((head, rest)) = chain.split_first() else {
            return;
        };

        if !head.is_dir {
            let leaf = self.alloc(Entry::from_segment(head));
            self.nodes[parent.0].children.push(leaf);
            return;
        }

        match self.find_dir(parent, &head.name) {
            Some(existing) => {
                if rest.is_empty() {
                    // The listed row for a directory carries the real timestamp;
                    // an earlier synthetic node has none.
                    self.nodes[existing.0].created_at = head.created_at;
                }
                self.insert_at(existing, rest);
            }
            None => {
                let dir = self.alloc(Entry::from_segment(head));
                self.insert_at(dir, rest);
                self.nodes[parent.0].children.push(dir);
            }
        }
    }

    fn alloc(&mut self, entry: Entry) -> NodeId {
        self.nodes.push(entry);
        NodeId(self.nodes.len() - 1)
    }

    /// Counts (directories, files) reachable from the root, root excluded.
    pub fn count_reachable(&self) -> (usize, usize) {
        let mut dirs = 0;
        let mut files = 0;
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            for (child, entry) in self.children(id) {
                if entry.is_dir {
                    dirs += 1;
                    stack.push(child);
                } else {
                    files += 1;
                }
            }
        }
        (dirs, files)
    }
}

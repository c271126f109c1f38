use git2::Oid;
use smallvec::SmallVec;

/// Child edges of a node, addressed by post-sort node index.
///
/// Almost every node in a linear ancestry has exactly one child, so the
/// edges live inline.
pub type ChildSet = SmallVec<[u32; 2]>;

/// A commit vertex in the ancestry graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Commit ID
    pub id: Oid,
    /// Parent steps from the walk's start along the longest discovered path
    pub depth: u32,
    /// Dense position in the depth-ordered node list
    pub index: u32,
    /// Nodes whose single parent is this node
    pub children: ChildSet,
}

impl GraphNode {
    pub(crate) fn new(id: Oid, depth: u32, index: u32) -> Self {
        Self {
            id,
            depth,
            index,
            children: ChildSet::new(),
        }
    }

    /// Record a child edge, ignoring duplicates
    pub(crate) fn add_child(&mut self, child: u32) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Check if this node has no recorded children (the walk's start)
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if more than one discovered line converges on this node
    pub fn is_fork_point(&self) -> bool {
        self.children.len() > 1
    }
}

use super::ancestry::AncestryGraph;
use super::error::{GraphError, Result};
use super::node::GraphNode;
use git2::Oid;
use std::collections::HashMap;
use tracing::debug;

/// Parent information the builder needs from an object store
pub trait ParentLookup {
    /// Resolve a commit spec (full or short hash, ref name) to a commit ID
    fn resolve(&self, spec: &str) -> Result<Oid>;

    /// Parent IDs of a commit, in order
    fn parent_ids(&self, id: Oid) -> Result<Vec<Oid>>;
}

/// What to do when the walk reaches a parentless commit before the ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootPolicy {
    /// Report `NoPath`
    #[default]
    Fail,
    /// Hang the parentless commit under the ancestor node, which then stands
    /// in as a synthetic root
    Synthesize,
}

/// Discovers the commits between a descendant and one of its ancestors
pub struct AncestryBuilder<'a, L: ParentLookup + ?Sized> {
    lookup: &'a L,
    policy: RootPolicy,
}

impl<'a, L: ParentLookup + ?Sized> AncestryBuilder<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            policy: RootPolicy::default(),
        }
    }

    pub fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from commit specs resolved through the lookup
    pub fn build_from_specs(&self, start: &str, end: &str) -> Result<AncestryGraph> {
        let start = self.lookup.resolve(start)?;
        let end = self.lookup.resolve(end)?;
        self.build(start, end)
    }

    /// Build down to the root of history, using a synthetic root as the ancestor
    pub fn build_to_root(&self, start: Oid) -> Result<AncestryGraph> {
        Self {
            lookup: self.lookup,
            policy: RootPolicy::Synthesize,
        }
        .build(start, Oid::zero())
    }

    /// Walk from `start` towards `end` and build the depth-ordered graph.
    ///
    /// Only `start` may have more than one parent; each of its parent lines
    /// must reach `end` on its own.
    pub fn build(&self, start: Oid, end: Oid) -> Result<AncestryGraph> {
        let synthetic_end = end.is_zero();
        if synthetic_end && self.policy != RootPolicy::Synthesize {
            return Err(GraphError::CommitNotFound(end.to_string()));
        }
        if !synthetic_end {
            // Both endpoints must exist before anything is walked
            self.lookup.parent_ids(end)?;
        }

        let mut nodes = vec![GraphNode::new(start, 0, 0)];
        let mut lookup: HashMap<Oid, u32> = HashMap::new();
        lookup.insert(start, 0);
        let end_index = if start == end {
            0
        } else {
            nodes.push(GraphNode::new(end, 0, 1));
            lookup.insert(end, 1);
            1
        };

        let mut stack = vec![0u32];
        while let Some(current) = stack.pop() {
            let (id, depth) = {
                let node = &nodes[current as usize];
                (node.id, node.depth)
            };
            if id == end {
                continue;
            }

            let parents = self.lookup.parent_ids(id)?;
            match parents.len() {
                0 if self.policy == RootPolicy::Synthesize => {
                    debug!(commit = %id, "linking parentless commit under synthetic root");
                    nodes[end_index as usize].add_child(current);
                    raise_depth(&mut nodes, end_index, depth + 1);
                    continue;
                }
                0 => return Err(GraphError::NoPath { start, end }),
                1 => {}
                _ if current == 0 => {
                    debug!(commit = %id, parents = parents.len(), "walking every parent of start");
                }
                count => {
                    return Err(GraphError::MergeCommitUnsupported {
                        commit: id,
                        parents: count,
                    })
                }
            }

            // Reverse so the first parent is popped first
            for parent in parents.into_iter().rev() {
                match lookup.get(&parent) {
                    Some(&known) => {
                        nodes[known as usize].add_child(current);
                        if raise_depth(&mut nodes, known, depth + 1) {
                            // Ancestors below a raised node need raising too
                            stack.push(known);
                        }
                    }
                    None => {
                        let index = nodes.len() as u32;
                        let mut node = GraphNode::new(parent, depth + 1, index);
                        node.add_child(current);
                        nodes.push(node);
                        lookup.insert(parent, index);
                        stack.push(index);
                    }
                }
            }
        }

        debug!(
            start = %start,
            end = %end,
            nodes = nodes.len(),
            "ancestry walk finished"
        );
        Ok(AncestryGraph::from_discovery(nodes, start, end))
    }
}

/// Raise a node's depth to at least `depth`; returns true if it changed
fn raise_depth(nodes: &mut [GraphNode], index: u32, depth: u32) -> bool {
    let node = &mut nodes[index as usize];
    if node.depth < depth {
        node.depth = depth;
        true
    } else {
        false
    }
}

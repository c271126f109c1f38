use super::node::GraphNode;
use git2::Oid;
use std::collections::HashMap;
use std::slice::ChunkBy;

type SameDepth = fn(&GraphNode, &GraphNode) -> bool;

fn same_depth(a: &GraphNode, b: &GraphNode) -> bool {
    a.depth == b.depth
}

/// Commits between two endpoints of a history, ordered by depth
///
/// Nodes are stored in an arena addressed by their post-sort index. Index 0 is
/// the shallowest node (the walk's start) and the last index is the deepest
/// node, which is always the requested ancestor.
#[derive(Debug, Clone)]
pub struct AncestryGraph {
    nodes: Vec<GraphNode>,
    lookup: HashMap<Oid, u32>,
    start: Oid,
    end: Oid,
    max_depth: u32,
    max_width: usize,
}

impl AncestryGraph {
    /// Finish construction from nodes in discovery order.
    ///
    /// `nodes[i].index` must equal `i` and every child edge must use discovery
    /// indices. The nodes are stable-sorted by depth and every index is
    /// rewritten through a single old→new table.
    pub(crate) fn from_discovery(mut nodes: Vec<GraphNode>, start: Oid, end: Oid) -> Self {
        nodes.sort_by_key(|node| node.depth);

        let mut remap = vec![0u32; nodes.len()];
        for (position, node) in nodes.iter().enumerate() {
            remap[node.index as usize] = position as u32;
        }

        let mut lookup = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter_mut().enumerate() {
            node.index = position as u32;
            for child in node.children.iter_mut() {
                *child = remap[*child as usize];
            }
            lookup.insert(node.id, node.index);
        }

        let max_width = nodes
            .chunk_by(same_depth)
            .map(|group| group.len())
            .max()
            .unwrap_or(0);
        let max_depth = nodes.last().map(|node| node.depth).unwrap_or(0);

        Self {
            nodes,
            lookup,
            start,
            end,
            max_depth,
            max_width,
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in index order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Node at a post-sort index
    pub fn node(&self, index: u32) -> Option<&GraphNode> {
        self.nodes.get(index as usize)
    }

    /// Node for a commit ID
    pub fn get(&self, id: &Oid) -> Option<&GraphNode> {
        self.index_of(id).and_then(|index| self.node(index))
    }

    pub fn index_of(&self, id: &Oid) -> Option<u32> {
        self.lookup.get(id).copied()
    }

    pub fn contains(&self, id: &Oid) -> bool {
        self.lookup.contains_key(id)
    }

    /// The shallowest node (index 0)
    pub fn head(&self) -> &GraphNode {
        &self.nodes[0]
    }

    /// The deepest node: the common ancestor the walk stopped at
    pub fn first_node(&self) -> &GraphNode {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Commit the walk started from
    pub fn start(&self) -> Oid {
        self.start
    }

    /// Ancestor the walk stopped at (zero for a synthetic root)
    pub fn end(&self) -> Oid {
        self.end
    }

    /// Check if the graph bottoms out at a synthetic root rather than a commit
    pub fn has_synthetic_root(&self) -> bool {
        self.end.is_zero()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Size of the largest group of nodes sharing a depth
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// The node whose child edges include `index`
    pub fn parent_of(&self, index: u32) -> Option<&GraphNode> {
        let from = index as usize + 1;
        self.nodes
            .get(from..)?
            .iter()
            .find(|node| node.children.contains(&index))
    }

    /// Depth groups from the start towards the ancestor
    pub fn iter_depths(&self) -> DepthGroups<'_> {
        DepthGroups {
            inner: self.nodes.chunk_by(same_depth as SameDepth),
        }
    }

    /// Depth groups from the ancestor towards the start
    pub fn iter_depths_rev(&self) -> std::iter::Rev<DepthGroups<'_>> {
        self.iter_depths().rev()
    }

    /// Every commit except the ancestor, oldest first
    ///
    /// This is the order in which a rebase replays the commits.
    pub fn commits_oldest_first(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .rev()
            .filter(|node| node.id != self.end)
            .collect()
    }
}

/// Iterator over `(depth, nodes)` groups of an [`AncestryGraph`]
pub struct DepthGroups<'a> {
    inner: ChunkBy<'a, GraphNode, SameDepth>,
}

impl<'a> Iterator for DepthGroups<'a> {
    type Item = (u32, &'a [GraphNode]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|group| (group[0].depth, group))
    }
}

impl DoubleEndedIterator for DepthGroups<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|group| (group[0].depth, group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> Oid {
        Oid::from_bytes(&[n; 20]).unwrap()
    }

    /// Discovery order: start, end, a, b, c with lines start-a-end and start-c-b-end
    fn discovery() -> Vec<GraphNode> {
        let start = GraphNode::new(oid(1), 0, 0);
        let mut end = GraphNode::new(oid(9), 3, 1);
        end.add_child(2);
        end.add_child(3);
        let mut a = GraphNode::new(oid(2), 1, 2);
        a.add_child(0);
        let mut b = GraphNode::new(oid(3), 2, 3);
        b.add_child(4);
        let mut c = GraphNode::new(oid(4), 1, 4);
        c.add_child(0);
        vec![start, end, a, b, c]
    }

    #[test]
    fn test_sort_reassigns_dense_indices() {
        let graph = AncestryGraph::from_discovery(discovery(), oid(1), oid(9));

        let depths: Vec<u32> = graph.nodes().iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 2, 3]);
        for (i, node) in graph.nodes().iter().enumerate() {
            assert_eq!(node.index as usize, i);
            assert_eq!(graph.index_of(&node.id), Some(i as u32));
        }
        // Stable within a depth: `a` was discovered before `c`
        assert_eq!(graph.node(1).unwrap().id, oid(2));
        assert_eq!(graph.node(2).unwrap().id, oid(4));
    }

    #[test]
    fn test_children_follow_the_remap() {
        let graph = AncestryGraph::from_discovery(discovery(), oid(1), oid(9));

        let end = graph.first_node();
        assert_eq!(end.id, oid(9));
        let mut children: Vec<Oid> = end
            .children
            .iter()
            .map(|&i| graph.node(i).unwrap().id)
            .collect();
        children.sort();
        assert_eq!(children, vec![oid(2), oid(3)]);

        let b = graph.get(&oid(3)).unwrap();
        assert_eq!(graph.node(b.children[0]).unwrap().id, oid(4));
        assert_eq!(graph.parent_of(b.index).unwrap().id, oid(9));
    }

    #[test]
    fn test_depth_groups_cover_every_node_once() {
        let graph = AncestryGraph::from_discovery(discovery(), oid(1), oid(9));

        let forward: Vec<(u32, usize)> = graph
            .iter_depths()
            .map(|(depth, nodes)| (depth, nodes.len()))
            .collect();
        assert_eq!(forward, vec![(0, 1), (1, 2), (2, 1), (3, 1)]);

        let backward: Vec<u32> = graph.iter_depths_rev().map(|(depth, _)| depth).collect();
        assert_eq!(backward, vec![3, 2, 1, 0]);

        assert_eq!(graph.max_width(), 2);
        assert_eq!(graph.max_depth(), 3);
    }

    #[test]
    fn test_commits_oldest_first_skips_the_ancestor() {
        let graph = AncestryGraph::from_discovery(discovery(), oid(1), oid(9));
        let order: Vec<Oid> = graph.commits_oldest_first().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![oid(3), oid(4), oid(2), oid(1)]);
    }
}

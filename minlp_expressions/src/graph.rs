use tracing::trace;

use crate::arena::{GraphId, ProblemId};
use crate::node::{Node, NodeIdx, NodeKind};

/// Owner of the nodes of one problem.
///
/// Insertion assigns dense, zero-based indices in insertion order. Children must already be in the
/// graph when their parent is inserted, so every child index is smaller than its parent's.
#[derive(Debug)]
pub struct Graph {
    id: GraphId,
    problem: Option<ProblemId>,
    nodes: Vec<Node>,
    // Structural depth: variables 0, constants 1, operators 1 + deepest child.
    vertex_depths: Vec<u32>,
}

impl Graph {
    pub(crate) fn new(id: GraphId, problem: Option<ProblemId>) -> Self {
        Self {
            id,
            problem,
            nodes: Vec::new(),
            vertex_depths: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> GraphId {
        self.id
    }

    #[inline]
    pub fn problem(&self) -> Option<ProblemId> {
        self.problem
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Take ownership of `node` and assign it the next index.
    ///
    /// # Panics
    ///
    /// If the node is already attached, names another graph or problem, or has a child that is not
    /// in this graph yet.
    pub fn insert(&mut self, mut node: Node) -> NodeIdx {
        assert!(!node.is_attached(), "node {} is already attached", node.uid());
        if let Some(graph) = node.graph() {
            assert_eq!(graph, self.id, "node {} claims {graph} but is inserted into {}", node.uid(), self.id);
        }
        if let (Some(claimed), Some(owner)) = (node.problem(), self.problem) {
            assert_eq!(claimed, owner, "node {} claims {claimed} but graph belongs to {owner}", node.uid());
        }

        let idx = NodeIdx::new(self.nodes.len());
        let depth = match node.kind() {
            NodeKind::Variable(_) => 0,
            NodeKind::Constant(_) => 1,
            NodeKind::Operator { children, .. } => {
                let deepest = children
                    .iter()
                    .map(|c| {
                        assert!(c.index() < self.nodes.len(), "child {c} of node {} is not in {}", node.uid(), self.id);
                        self.vertex_depths[c.index()]
                    })
                    .max()
                    .unwrap_or(0);
                deepest + 1
            }
        };

        node.set_idx(idx);
        node.set_graph(self.id);
        if let Some(problem) = self.problem {
            node.set_problem(problem);
        }
        trace!(graph = %self.id, %idx, uid = %node.uid(), depth, "attached node");
        self.nodes.push(node);
        self.vertex_depths.push(depth);
        idx
    }

    /// # Panics
    ///
    /// If `idx` is not in this graph.
    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    #[inline]
    pub fn get(&self, idx: NodeIdx) -> Option<&Node> {
        self.nodes.get(idx.index())
    }

    /// Update the evaluation depth hint of an attached node. This is the only change a node
    /// accepts once it is in a graph.
    ///
    /// # Panics
    ///
    /// If `idx` is not in this graph.
    pub fn set_depth(&mut self, idx: NodeIdx, depth: u32) {
        self.nodes[idx.index()].set_depth(depth);
    }

    /// All nodes in increasing index order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Whether `node` is the node this graph holds at `node.idx()`.
    pub fn owns(&self, node: &Node) -> bool {
        node.graph() == Some(self.id)
            && node
                .idx()
                .and_then(|idx| self.get(idx))
                .is_some_and(|held| held.uid() == node.uid())
    }

    pub(crate) fn assert_owns(&self, node: &Node) {
        assert!(self.owns(node), "node {} is not owned by {}", node.uid(), self.id);
    }

    pub fn vertex_depth(&self, idx: NodeIdx) -> u32 {
        self.vertex_depths[idx.index()]
    }

    pub fn max_depth(&self) -> u32 {
        self.vertex_depths.iter().copied().max().unwrap_or(0)
    }

    /// Evaluation order: by structural depth, ties broken by index.
    pub fn topological_order(&self) -> Vec<NodeIdx> {
        let mut order: Vec<NodeIdx> = (0..self.nodes.len()).map(NodeIdx::new).collect();
        order.sort_by_key(|idx| (self.vertex_depths[idx.index()], *idx));
        order
    }

    /// Indices reachable from `root` (including it), ascending. Ascending index order is a valid
    /// evaluation order for the subtree.
    pub fn subtree(&self, root: NodeIdx) -> Vec<NodeIdx> {
        let mut seen = vec![false; root.index() + 1];
        let mut stack = vec![root];
        seen[root.index()] = true;
        while let Some(idx) = stack.pop() {
            for &c in self.node(idx).children() {
                if !seen[c.index()] {
                    seen[c.index()] = true;
                    stack.push(c);
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then(|| NodeIdx::new(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Model;
    use crate::operators::OpKind;

    #[test]
    fn depth_follows_children() {
        let mut model = Model::new();
        let gid = model.create_graph();
        let uids = model.uid_generator();
        let graph = model.graph_mut(gid).unwrap();

        let c = graph.insert(Node::constant(&uids, 1.234));
        let x = graph.insert(Node::variable(&uids, crate::VariableId::new(0)));
        let s = graph.insert(Node::operator(&uids, OpKind::Sum, vec![c, x]));

        assert_eq!(graph.vertex_depth(x), 0);
        assert_eq!(graph.vertex_depth(c), 1);
        assert_eq!(graph.vertex_depth(s), 2);
        assert_eq!(graph.max_depth(), 2);
        assert_eq!(graph.topological_order(), vec![x, c, s]);
    }

    #[test]
    fn subtree_skips_unrelated_nodes_and_shares_children() {
        let mut model = Model::new();
        let gid = model.create_graph();
        let uids = model.uid_generator();
        let graph = model.graph_mut(gid).unwrap();

        let x = graph.insert(Node::variable(&uids, crate::VariableId::new(0)));
        let unrelated = graph.insert(Node::constant(&uids, 9.0));
        let sq = graph.insert(Node::operator(&uids, OpKind::Product, vec![x, x]));
        let root = graph.insert(Node::operator(&uids, OpKind::Sum, vec![sq, x]));

        let sub = graph.subtree(root);
        assert_eq!(sub, vec![x, sq, root]);
        assert!(!sub.contains(&unrelated));
    }

    #[test]
    fn inserting_before_children_panics() {
        let mut model = Model::new();
        let gid = model.create_graph();
        let uids = model.uid_generator();
        let graph = model.graph_mut(gid).unwrap();
        let orphan = Node::operator(&uids, OpKind::Negation, vec![NodeIdx::new(0)]);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| graph.insert(orphan)));
        assert!(res.is_err());
        assert!(graph.is_empty());
    }
}

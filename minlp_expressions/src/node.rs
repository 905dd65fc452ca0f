use std::fmt;

use crate::algebra::Algebra;
use crate::arena::{GraphId, ProblemId};
use crate::compile::TreeData;
use crate::degree::PolynomialDegree;
use crate::error::EvalResult;
use crate::evaluate::EvalOptions;
use crate::graph::Graph;
use crate::operators::OpKind;
use crate::uid::{Uid, UidGenerator};
use crate::values::Values;

/// Depth hint given to nodes that are not constructed with an explicit one.
pub const DEFAULT_DEPTH: u32 = 3;

macro_rules! dense_index {
    ($(#[$meta:meta])* $Name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $Name(u32);

        impl $Name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect(concat!(stringify!($Name), " exceeds u32::MAX")))
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

dense_index!(
    /// Position of a node inside its graph, assigned on insertion.
    NodeIdx,
    "#"
);
dense_index!(
    /// Position of a variable in its problem's variable list. Value assignments and derivative
    /// maps are keyed by this.
    VariableId,
    "x"
);

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Variable(VariableId),
    Constant(f64),
    Operator { op: OpKind, children: Vec<NodeIdx> },
}

/// A vertex of the expression DAG.
///
/// A node starts unattached (no graph, no index) and becomes attached exactly once, when a
/// [`Graph`] takes ownership of it. Its problem and graph back-references are arena keys, so they
/// never keep the owner alive.
#[derive(Clone, Debug)]
pub struct Node {
    uid: Uid,
    idx: Option<NodeIdx>,
    depth: u32,
    problem: Option<ProblemId>,
    graph: Option<GraphId>,
    kind: NodeKind,
}

impl Node {
    fn with_kind(uids: &UidGenerator, kind: NodeKind) -> Self {
        Self {
            uid: uids.next_uid(),
            idx: None,
            depth: DEFAULT_DEPTH,
            problem: None,
            graph: None,
            kind,
        }
    }

    pub fn variable(uids: &UidGenerator, variable: VariableId) -> Self {
        Self::with_kind(uids, NodeKind::Variable(variable))
    }

    pub fn constant(uids: &UidGenerator, value: f64) -> Self {
        Self::with_kind(uids, NodeKind::Constant(value))
    }

    /// # Panics
    ///
    /// If `children.len()` does not fit the operator's arity.
    pub fn operator(uids: &UidGenerator, op: OpKind, children: Vec<NodeIdx>) -> Self {
        assert!(
            op.arity().accepts(children.len()),
            "{} does not accept {} children ({:?})",
            op.name(),
            children.len(),
            op.arity()
        );
        Self::with_kind(uids, NodeKind::Operator { op, children })
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_problem(mut self, problem: ProblemId) -> Self {
        self.set_problem(problem);
        self
    }

    #[inline]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// `None` until the node is inserted into a graph.
    #[inline]
    pub fn idx(&self) -> Option<NodeIdx> {
        self.idx
    }

    /// # Panics
    ///
    /// If an index was already assigned and `idx` differs from it.
    pub fn set_idx(&mut self, idx: NodeIdx) {
        if let Some(current) = self.idx {
            assert_eq!(current, idx, "node {} already has index {current}", self.uid);
        }
        self.idx = Some(idx);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    #[inline]
    pub fn problem(&self) -> Option<ProblemId> {
        self.problem
    }

    /// # Panics
    ///
    /// If the node is attached and already belongs to a different problem.
    pub fn set_problem(&mut self, problem: ProblemId) {
        if self.is_attached() {
            if let Some(current) = self.problem {
                assert_eq!(current, problem, "attached node {} cannot move to another problem", self.uid);
            }
        }
        self.problem = Some(problem);
    }

    #[inline]
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    /// # Panics
    ///
    /// If the node already names a different graph. Nodes never migrate between graphs.
    pub fn set_graph(&mut self, graph: GraphId) {
        if let Some(current) = self.graph {
            assert_eq!(current, graph, "node {} already belongs to {current}", self.uid);
        }
        self.graph = Some(graph);
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.idx.is_some()
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn op(&self) -> Option<&OpKind> {
        match &self.kind {
            NodeKind::Operator { op, .. } => Some(op),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, NodeKind::Variable(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.kind, NodeKind::Operator { .. })
    }

    pub fn variable_id(&self) -> Option<VariableId> {
        match self.kind {
            NodeKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn constant_value(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn num_children(&self) -> usize {
        self.children().len()
    }

    /// Children in the order the operator consumes them.
    pub fn children(&self) -> &[NodeIdx] {
        match &self.kind {
            NodeKind::Operator { children, .. } => children,
            _ => &[],
        }
    }

    /// # Panics
    ///
    /// If `n >= num_children()`.
    pub fn nth_children(&self, n: usize) -> NodeIdx {
        let children = self.children();
        assert!(
            n < children.len(),
            "child index {n} out of range for node {} with {} children",
            self.uid,
            children.len()
        );
        children[n]
    }

    pub fn get_child(&self, n: usize) -> Option<NodeIdx> {
        self.children().get(n).copied()
    }

    fn attached_idx(&self, graph: &Graph) -> NodeIdx {
        graph.assert_owns(self);
        self.idx.expect("owned nodes have an index")
    }

    /// Evaluate the subtree rooted here under algebra `A`.
    ///
    /// # Panics
    ///
    /// If `graph` does not own this node.
    pub fn eval<A: Algebra>(&self, graph: &Graph, values: &Values<A>, opts: &EvalOptions) -> EvalResult<A> {
        graph.eval(self.attached_idx(graph), values, opts)
    }

    pub fn polynomial_degree(&self, graph: &Graph) -> PolynomialDegree {
        graph.polynomial_degree(self.attached_idx(graph))
    }

    /// Flatten the subtree rooted here. `num_variables == 0` lets the buffers size themselves.
    pub fn expression_tree_data(&self, graph: &Graph, num_variables: usize) -> TreeData {
        TreeData::compile(graph, self.attached_idx(graph), num_variables)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

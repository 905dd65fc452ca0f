use std::sync::Arc;

use tracing::debug;

use crate::arena::{Arena, ArenaKey, GraphId, ProblemId};
use crate::error::ReferenceError;
use crate::graph::Graph;
use crate::node::Node;
use crate::problem::{Problem, ProblemBuilder};
use crate::uid::UidGenerator;

fn freed<K: ArenaKey>(key: K) -> ReferenceError {
    ReferenceError::Freed {
        kind: K::KIND,
        slot: key.slot().to_string(),
    }
}

/// Owner of problems and graphs.
///
/// Strong ownership runs one way: model → problem/graph → nodes. Nodes and problems point back
/// through arena keys that this type resolves on demand.
#[derive(Debug, Default)]
pub struct Model {
    uids: Arc<UidGenerator>,
    problems: Arena<ProblemId, Problem>,
    graphs: Arena<GraphId, Graph>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a uid counter between models (or inject one with a known start).
    pub fn with_uid_generator(uids: Arc<UidGenerator>) -> Self {
        Self {
            uids,
            ..Self::default()
        }
    }

    pub fn uid_generator(&self) -> Arc<UidGenerator> {
        Arc::clone(&self.uids)
    }

    pub fn create_problem(&mut self, name: impl Into<String>) -> ProblemId {
        let name = name.into();
        let graphs = &mut self.graphs;
        let problem = self.problems.insert_with(|pid| {
            let graph = graphs.insert_with(|gid| Graph::new(gid, Some(pid)));
            debug!(problem = %pid, %graph, %name, "created problem");
            Problem::new(pid, name, graph)
        });
        problem
    }

    /// A graph that belongs to no problem.
    pub fn create_graph(&mut self) -> GraphId {
        self.graphs.insert_with(|gid| Graph::new(gid, None))
    }

    pub fn problem(&self, id: ProblemId) -> Result<&Problem, ReferenceError> {
        self.problems.get(id).ok_or_else(|| freed(id))
    }

    pub fn graph(&self, id: GraphId) -> Result<&Graph, ReferenceError> {
        self.graphs.get(id).ok_or_else(|| freed(id))
    }

    pub fn graph_mut(&mut self, id: GraphId) -> Result<&mut Graph, ReferenceError> {
        self.graphs.get_mut(id).ok_or_else(|| freed(id))
    }

    /// The problem and the graph holding its nodes.
    pub fn problem_with_graph(&self, id: ProblemId) -> Result<(&Problem, &Graph), ReferenceError> {
        let problem = self.problem(id)?;
        let graph = self.graph(problem.graph_id())?;
        Ok((problem, graph))
    }

    pub fn problem_builder(&mut self, id: ProblemId) -> Result<ProblemBuilder<'_>, ReferenceError> {
        let problem = self.problems.get_mut(id).ok_or_else(|| freed(id))?;
        let graph_id = problem.graph_id();
        let graph = self.graphs.get_mut(graph_id).ok_or_else(|| freed(graph_id))?;
        Ok(ProblemBuilder {
            problem,
            graph,
            uids: &self.uids,
        })
    }

    /// Destroy a problem and its graph. Keys to either stop resolving.
    pub fn remove_problem(&mut self, id: ProblemId) -> Result<(), ReferenceError> {
        let problem = self.problems.remove(id).ok_or_else(|| freed(id))?;
        let nodes = self.graphs.remove(problem.graph_id()).map_or(0, |g| g.len());
        debug!(problem = %id, nodes, "removed problem");
        Ok(())
    }

    pub fn remove_graph(&mut self, id: GraphId) -> Result<(), ReferenceError> {
        let graph = self.graphs.remove(id).ok_or_else(|| freed(id))?;
        debug!(graph = %id, nodes = graph.len(), "removed graph");
        Ok(())
    }

    /// Follow a node's graph back-reference.
    ///
    /// # Panics
    ///
    /// If the graph resolves but does not hold this node.
    pub fn graph_of(&self, node: &Node) -> Result<&Graph, ReferenceError> {
        let id = node.graph().ok_or(ReferenceError::Unset("graph"))?;
        let graph = self.graph(id)?;
        graph.assert_owns(node);
        Ok(graph)
    }

    /// Follow a node's problem back-reference.
    ///
    /// # Panics
    ///
    /// If the node is attached and the problem's graph does not hold it.
    pub fn problem_of(&self, node: &Node) -> Result<&Problem, ReferenceError> {
        let id = node.problem().ok_or(ReferenceError::Unset("problem"))?;
        let problem = self.problem(id)?;
        if node.is_attached() {
            self.graph(problem.graph_id())?.assert_owns(node);
        }
        Ok(problem)
    }

    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().map(|(_, p)| p)
    }

    pub fn num_problems(&self) -> usize {
        self.problems.len()
    }

    pub fn num_graphs(&self) -> usize {
        self.graphs.len()
    }
}

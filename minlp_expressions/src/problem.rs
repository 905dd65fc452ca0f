use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::arena::{GraphId, ProblemId};
use crate::error::ModelError;
use crate::graph::Graph;
use crate::node::{Node, NodeIdx, NodeKind, VariableId};
use crate::operators::OpKind;
use crate::uid::UidGenerator;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Real,
    Integer,
    Binary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub domain: Domain,
    pub node: NodeIdx,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub root: NodeIdx,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    pub name: String,
    pub root: NodeIdx,
    pub sense: Sense,
}

/// Variables, constraints and objectives of one optimization problem. Everything they reference
/// lives in the problem's own graph.
#[derive(Debug)]
pub struct Problem {
    id: ProblemId,
    name: String,
    graph: GraphId,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objectives: Vec<Objective>,
}

impl Problem {
    pub(crate) fn new(id: ProblemId, name: String, graph: GraphId) -> Self {
        Self {
            id,
            name,
            graph,
            variables: Vec::new(),
            constraints: Vec::new(),
            objectives: Vec::new(),
        }
    }

    pub fn id(&self) -> ProblemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VariableId> {
        self.variables.iter().position(|v| v.name == name).map(VariableId::new)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn lower_bounds(&self) -> Vec<Option<f64>> {
        self.variables.iter().map(|v| v.lower_bound).collect()
    }

    pub fn upper_bounds(&self) -> Vec<Option<f64>> {
        self.variables.iter().map(|v| v.upper_bound).collect()
    }
}

fn check_bounds(lower: Option<f64>, upper: Option<f64>) -> Result<(), ModelError> {
    match (lower, upper) {
        (Some(l), _) if l.is_nan() => Err(ModelError::InvalidBounds { lower, upper }),
        (_, Some(u)) if u.is_nan() => Err(ModelError::InvalidBounds { lower, upper }),
        (Some(l), Some(u)) if l > u => Err(ModelError::InvalidBounds { lower, upper }),
        _ => Ok(()),
    }
}

/// Mutable view over a problem together with its graph, handed out by
/// [`Model::problem_builder`](crate::Model::problem_builder).
pub struct ProblemBuilder<'m> {
    pub(crate) problem: &'m mut Problem,
    pub(crate) graph: &'m mut Graph,
    pub(crate) uids: &'m UidGenerator,
}

impl ProblemBuilder<'_> {
    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn uids(&self) -> &UidGenerator {
        self.uids
    }

    /// Binary variables without explicit bounds get `[0, 1]`.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
        domain: Domain,
    ) -> Result<VariableId, ModelError> {
        let name = name.into();
        if self.problem.variable_by_name(&name).is_some() {
            return Err(ModelError::DuplicateName { kind: "variable", name });
        }
        let (lower_bound, upper_bound) = match domain {
            Domain::Binary => (lower_bound.or(Some(0.0)), upper_bound.or(Some(1.0))),
            _ => (lower_bound, upper_bound),
        };
        check_bounds(lower_bound, upper_bound)?;

        let id = VariableId::new(self.problem.variables.len());
        let node = self.graph.insert(Node::variable(self.uids, id));
        trace!(problem = %self.problem.id, %id, %name, "added variable");
        self.problem.variables.push(Variable {
            name,
            lower_bound,
            upper_bound,
            domain,
            node,
        });
        Ok(id)
    }

    pub fn set_bounds(
        &mut self,
        variable: VariableId,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    ) -> Result<(), ModelError> {
        check_bounds(lower_bound, upper_bound)?;
        let v = self
            .problem
            .variables
            .get_mut(variable.index())
            .ok_or(ModelError::UnknownVariable(variable))?;
        v.lower_bound = lower_bound;
        v.upper_bound = upper_bound;
        Ok(())
    }

    /// Node index of a variable.
    pub fn variable_node(&self, variable: VariableId) -> Option<NodeIdx> {
        self.problem.variable(variable).map(|v| v.node)
    }

    /// Attach an externally built node.
    ///
    /// # Panics
    ///
    /// If the node is a variable this problem never declared, or if [`Graph::insert`] rejects it.
    pub fn insert_vertex(&mut self, node: Node) -> NodeIdx {
        if let NodeKind::Variable(v) = node.kind() {
            assert!(
                v.index() < self.problem.variables.len(),
                "variable {v} is not declared in {}",
                self.problem.id
            );
        }
        self.graph.insert(node)
    }

    pub fn constant(&mut self, value: f64) -> NodeIdx {
        let node = Node::constant(self.uids, value);
        self.insert_vertex(node)
    }

    pub fn operator(&mut self, op: OpKind, children: Vec<NodeIdx>) -> NodeIdx {
        let node = Node::operator(self.uids, op, children);
        self.insert_vertex(node)
    }

    fn check_root(&self, root: NodeIdx) -> Result<(), ModelError> {
        if root.index() < self.graph.len() {
            Ok(())
        } else {
            Err(ModelError::ForeignNode(root))
        }
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        root: NodeIdx,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    ) -> Result<usize, ModelError> {
        let name = name.into();
        self.check_root(root)?;
        check_bounds(lower_bound, upper_bound)?;
        if self.problem.constraint_by_name(&name).is_some() {
            return Err(ModelError::DuplicateName { kind: "constraint", name });
        }
        self.problem.constraints.push(Constraint {
            name,
            root,
            lower_bound,
            upper_bound,
        });
        Ok(self.problem.constraints.len() - 1)
    }

    pub fn add_objective(&mut self, name: impl Into<String>, root: NodeIdx, sense: Sense) -> Result<usize, ModelError> {
        let name = name.into();
        self.check_root(root)?;
        if self.problem.objectives.iter().any(|o| o.name == name) {
            return Err(ModelError::DuplicateName { kind: "objective", name });
        }
        self.problem.objectives.push(Objective { name, root, sense });
        Ok(self.problem.objectives.len() - 1)
    }
}

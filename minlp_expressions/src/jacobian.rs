use rayon::prelude::*;
use tracing::debug;

use crate::algebra::Dual;
use crate::arena::ProblemId;
use crate::error::{EvalResult, ModelError};
use crate::evaluate::EvalOptions;
use crate::graph::Graph;
use crate::model::Model;
use crate::node::{NodeIdx, VariableId};
use crate::problem::Problem;
use crate::values::Values;

/// Nonzero partial derivatives of one function, ordered by variable.
pub type SparseRow = Vec<(VariableId, f64)>;

fn gradient_row(graph: &Graph, root: NodeIdx, point: &Values<Dual>, opts: &EvalOptions) -> EvalResult<SparseRow> {
    let dual = graph.eval(root, point, opts)?;
    Ok(dual.gradient.iter().filter(|&(_, d)| d != 0.0).collect())
}

impl Problem {
    pub(crate) fn assert_graph(&self, graph: &Graph) {
        assert_eq!(graph.id(), self.graph_id(), "{} is not the graph of {}", graph.id(), self.id());
    }

    /// Value of every constraint body at `x`, in declaration order.
    pub fn constraint_values(&self, graph: &Graph, x: &[f64], opts: &EvalOptions) -> EvalResult<Vec<f64>> {
        self.assert_graph(graph);
        let point = Values::from_slice(x);
        self.constraints()
            .iter()
            .map(|c| graph.eval(c.root, &point, opts))
            .collect()
    }

    /// One sparse row per constraint. Rows are evaluated in parallel.
    pub fn constraint_jacobian(&self, graph: &Graph, x: &[f64], opts: &EvalOptions) -> EvalResult<Vec<SparseRow>> {
        self.assert_graph(graph);
        let point = Values::seeded(x);
        let rows: Vec<SparseRow> = self
            .constraints()
            .par_iter()
            .map(|c| gradient_row(graph, c.root, &point, opts))
            .collect::<EvalResult<_>>()?;
        debug!(
            problem = %self.id(),
            rows = rows.len(),
            nonzeros = rows.iter().map(Vec::len).sum::<usize>(),
            "evaluated constraint jacobian"
        );
        Ok(rows)
    }

    /// # Panics
    ///
    /// If `objective` is out of range.
    pub fn objective_gradient(
        &self,
        graph: &Graph,
        objective: usize,
        x: &[f64],
        opts: &EvalOptions,
    ) -> EvalResult<SparseRow> {
        self.assert_graph(graph);
        gradient_row(graph, self.objectives()[objective].root, &Values::seeded(x), opts)
    }
}

impl Model {
    pub fn constraint_jacobian(
        &self,
        problem: ProblemId,
        x: &[f64],
        opts: &EvalOptions,
    ) -> Result<Vec<SparseRow>, ModelError> {
        let (problem, graph) = self.problem_with_graph(problem)?;
        Ok(problem.constraint_jacobian(graph, x, opts)?)
    }

    pub fn objective_gradient(
        &self,
        problem: ProblemId,
        objective: usize,
        x: &[f64],
        opts: &EvalOptions,
    ) -> Result<SparseRow, ModelError> {
        let (p, graph) = self.problem_with_graph(problem)?;
        if objective >= p.objectives().len() {
            return Err(ModelError::UnknownObjective(objective));
        }
        Ok(p.objective_gradient(graph, objective, x, opts)?)
    }
}

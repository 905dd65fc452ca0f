use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::algebra::Dual2;
use crate::arena::ProblemId;
use crate::error::{EvalResult, ModelError};
use crate::evaluate::EvalOptions;
use crate::graph::Graph;
use crate::model::Model;
use crate::node::{NodeIdx, VariableId};
use crate::problem::Problem;
use crate::values::Values;

/// Nonzero lower-triangle entries `((row, col), value)` of a symmetric second-derivative matrix,
/// `row >= col`, ordered by row then column.
pub type SparseHessian = Vec<((VariableId, VariableId), f64)>;

fn hessian_entries(
    graph: &Graph,
    root: NodeIdx,
    point: &Values<Dual2>,
    opts: &EvalOptions,
) -> EvalResult<SparseHessian> {
    let f = graph.eval(root, point, opts)?;
    Ok(f.hessian.iter().filter(|&(_, d)| d != 0.0).collect())
}

/// Accumulate `weight * h` into `acc`, keeping it sorted.
fn accumulate(acc: &mut SparseHessian, h: SparseHessian, weight: f64) {
    let mut merged: BTreeMap<(VariableId, VariableId), f64> = acc.drain(..).collect();
    for (k, d) in h {
        *merged.entry(k).or_insert(0.0) += weight * d;
    }
    acc.extend(merged);
}

impl Problem {
    /// Second derivatives of every constraint body at `x`. Constraints are evaluated in parallel.
    pub fn constraint_hessians(
        &self,
        graph: &Graph,
        x: &[f64],
        opts: &EvalOptions,
    ) -> EvalResult<Vec<SparseHessian>> {
        self.assert_graph(graph);
        let point = Values::<Dual2>::seeded(x);
        let hessians: Vec<SparseHessian> = self
            .constraints()
            .par_iter()
            .map(|c| hessian_entries(graph, c.root, &point, opts))
            .collect::<EvalResult<_>>()?;
        debug!(
            problem = %self.id(),
            constraints = hessians.len(),
            nonzeros = hessians.iter().map(Vec::len).sum::<usize>(),
            "evaluated constraint hessians"
        );
        Ok(hessians)
    }

    /// # Panics
    ///
    /// If `objective` is out of range.
    pub fn objective_hessian(
        &self,
        graph: &Graph,
        objective: usize,
        x: &[f64],
        opts: &EvalOptions,
    ) -> EvalResult<SparseHessian> {
        self.assert_graph(graph);
        hessian_entries(graph, self.objectives()[objective].root, &Values::seeded(x), opts)
    }

    /// Hessian of `objective_weight * f(x) + sum(multipliers[i] * g_i(x))` for the first objective,
    /// where `g_i` are the constraint bodies. Without an objective only the constraint terms remain.
    ///
    /// # Panics
    ///
    /// If `multipliers` does not have one entry per constraint.
    pub fn lagrangian_hessian(
        &self,
        graph: &Graph,
        objective_weight: f64,
        multipliers: &[f64],
        x: &[f64],
        opts: &EvalOptions,
    ) -> EvalResult<SparseHessian> {
        assert_eq!(
            multipliers.len(),
            self.constraints().len(),
            "one multiplier per constraint of {}",
            self.id()
        );
        let mut acc = SparseHessian::new();
        if objective_weight != 0.0 && !self.objectives().is_empty() {
            accumulate(&mut acc, self.objective_hessian(graph, 0, x, opts)?, objective_weight);
        }
        for (h, &m) in self.constraint_hessians(graph, x, opts)?.into_iter().zip(multipliers) {
            if m != 0.0 {
                accumulate(&mut acc, h, m);
            }
        }
        acc.retain(|&(_, d)| d != 0.0);
        Ok(acc)
    }
}

impl Model {
    pub fn constraint_hessians(
        &self,
        problem: ProblemId,
        x: &[f64],
        opts: &EvalOptions,
    ) -> Result<Vec<SparseHessian>, ModelError> {
        let (problem, graph) = self.problem_with_graph(problem)?;
        Ok(problem.constraint_hessians(graph, x, opts)?)
    }

    pub fn objective_hessian(
        &self,
        problem: ProblemId,
        objective: usize,
        x: &[f64],
        opts: &EvalOptions,
    ) -> Result<SparseHessian, ModelError> {
        let (p, graph) = self.problem_with_graph(problem)?;
        if objective >= p.objectives().len() {
            return Err(ModelError::UnknownObjective(objective));
        }
        Ok(p.objective_hessian(graph, objective, x, opts)?)
    }
}

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algebra::Algebra;
use crate::error::{EvalError, EvalResult};
use crate::graph::Graph;
use crate::node::{Node, NodeIdx, NodeKind};
use crate::values::Values;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Fail with [`EvalError::NonFinite`] as soon as any node evaluates to NaN/inf. When off,
    /// non-finite values propagate to the result unchanged.
    pub check_finite: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { check_finite: true }
    }
}

pub(crate) fn check_finite<A: Algebra>(value: A, node: NodeIdx, op: &'static str, opts: &EvalOptions) -> EvalResult<A> {
    if opts.check_finite && !value.is_finite() {
        debug!(%node, op, value = value.value(), "non-finite intermediate");
        return Err(EvalError::NonFinite {
            node,
            op,
            value: value.value(),
        });
    }
    Ok(value)
}

impl Node {
    /// Evaluate this node alone, given its children's values in child order.
    pub(crate) fn eval_local<A: Algebra>(&self, args: &[A], values: &Values<A>, opts: &EvalOptions) -> EvalResult<A> {
        let idx = self.idx().expect("only attached nodes are evaluated");
        match self.kind() {
            NodeKind::Variable(v) => {
                let value = values
                    .get(*v)
                    .cloned()
                    .ok_or(EvalError::UnboundVariable { variable: *v, node: idx })?;
                check_finite(value, idx, "variable", opts)
            }
            NodeKind::Constant(c) => check_finite(A::constant(*c), idx, "constant", opts),
            NodeKind::Operator { op, .. } => check_finite(op.apply(args), idx, op.name(), opts),
        }
    }
}

impl Graph {
    /// Evaluate the subtree rooted at `root`.
    ///
    /// Shared subexpressions are evaluated once. Only `values` differs between calls, so the same
    /// graph can be evaluated at any number of points without being rebuilt.
    pub fn eval<A: Algebra>(&self, root: NodeIdx, values: &Values<A>, opts: &EvalOptions) -> EvalResult<A> {
        let mut memo: Vec<Option<A>> = vec![None; root.index() + 1];
        let mut args: Vec<A> = Vec::new();
        for idx in self.subtree(root) {
            let node = self.node(idx);
            args.clear();
            args.extend(
                node.children()
                    .iter()
                    .map(|c| memo[c.index()].clone().expect("children precede parents")),
            );
            memo[idx.index()] = Some(node.eval_local(&args, values, opts)?);
        }
        Ok(memo[root.index()].take().expect("root is part of its own subtree"))
    }

    /// Evaluate `root` at many independent points in parallel.
    pub fn eval_points_par<A: Algebra>(
        &self,
        root: NodeIdx,
        points: &[Values<A>],
        opts: &EvalOptions,
    ) -> Vec<EvalResult<A>> {
        points.par_iter().map(|values| self.eval(root, values, opts)).collect()
    }
}

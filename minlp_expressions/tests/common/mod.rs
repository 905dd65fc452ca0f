use minlp_expressions::{
    Domain, EvalOptions, Graph, Model, NodeIdx, OpKind, ProblemBuilder, ProblemId, Values, VariableId,
};
use ndarray::Array2;

/// A problem with `n` unbounded real variables named `x0`, `x1`, ...
#[allow(dead_code)]
pub fn problem_with_vars(n: usize) -> (Model, ProblemId, Vec<VariableId>) {
    let mut model = Model::new();
    let pid = model.create_problem("test");
    let mut b = model.problem_builder(pid).unwrap();
    let vars = (0..n)
        .map(|i| b.add_variable(format!("x{i}"), None, None, Domain::Real).unwrap())
        .collect();
    (model, pid, vars)
}

#[allow(dead_code)]
pub fn var_node(b: &ProblemBuilder<'_>, v: VariableId) -> NodeIdx {
    b.variable_node(v).unwrap()
}

/// Step of a randomly generated expression. Operand indices are taken modulo the number of nodes
/// built so far, so any sequence of steps builds a valid DAG.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Step {
    Constant(f64),
    Unary(u8, usize),
    Binary(u8, usize, usize),
}

/// Build `steps` on top of the variable nodes and return the last node.
///
/// Only operators that are smooth and finite on the whole real line are used.
#[allow(dead_code)]
pub fn build_steps(b: &mut ProblemBuilder<'_>, leaves: &[NodeIdx], steps: &[Step]) -> NodeIdx {
    let mut built: Vec<NodeIdx> = leaves.to_vec();
    for step in steps {
        let pick = |i: usize| built[i % built.len()];
        let idx = match *step {
            Step::Constant(c) => b.constant(c),
            Step::Unary(k, a) => {
                let op = match k % 4 {
                    0 => OpKind::Sin,
                    1 => OpKind::Cos,
                    2 => OpKind::Atan,
                    _ => OpKind::Negation,
                };
                b.operator(op, vec![pick(a)])
            }
            Step::Binary(k, a, c) => {
                let (l, r) = (pick(a), pick(c));
                match k % 3 {
                    0 => b.operator(OpKind::Sum, vec![l, r]),
                    1 => b.operator(OpKind::Product, vec![l, r]),
                    _ => b.operator(
                        OpKind::Linear {
                            coefficients: vec![0.5, -1.5],
                            constant: 0.25,
                        },
                        vec![l, r],
                    ),
                }
            }
        };
        built.push(idx);
    }
    *built.last().unwrap()
}

#[allow(dead_code)]
pub fn step_strategy() -> impl proptest::strategy::Strategy<Value = Step> {
    use proptest::prelude::*;
    prop_oneof![
        (-2.0f64..2.0).prop_map(Step::Constant),
        (any::<u8>(), 0usize..64).prop_map(|(k, a)| Step::Unary(k, a)),
        (any::<u8>(), 0usize..64, 0usize..64).prop_map(|(k, a, c)| Step::Binary(k, a, c)),
    ]
}

#[allow(dead_code)]
pub fn finite_diff(graph: &Graph, root: NodeIdx, x: &[f64], dir: usize, eps: f64) -> f64 {
    let opts = EvalOptions::default();
    let mut plus = x.to_vec();
    let mut minus = x.to_vec();
    plus[dir] += eps;
    minus[dir] -= eps;
    let fp = graph.eval(root, &Values::from_slice(&plus), &opts).unwrap();
    let fm = graph.eval(root, &Values::from_slice(&minus), &opts).unwrap();
    (fp - fm) / (2.0 * eps)
}

/// `x_columns[[variable, row]]` filled with small distinct values.
#[allow(dead_code)]
pub fn make_x(n_variables: usize, n_rows: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_variables, n_rows), |(v, row)| {
        (row as f64 + 1.0) * (v as f64 + 1.0) * 0.01
    })
}

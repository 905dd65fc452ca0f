mod common;

use approx::assert_relative_eq;
use common::{build_steps, finite_diff, problem_with_vars, step_strategy, var_node};
use minlp_expressions::{Dual, EvalOptions, Graph, NodeIdx, OpKind, Values, VariableId};
use proptest::prelude::*;

fn check_against_finite_diff(graph: &Graph, root: NodeIdx, x: &[f64]) {
    let dual = graph
        .eval(root, &Values::<Dual>::seeded(x), &EvalOptions::default())
        .unwrap();
    for (i, _) in x.iter().enumerate() {
        let v = VariableId::new(i);
        let fd = finite_diff(graph, root, x, i, 1e-6);
        assert_relative_eq!(dual.derivative(v), fd, epsilon = 1e-6, max_relative = 1e-5);
    }
}

#[test]
fn every_unary_function_matches_finite_differences() {
    let x = [0.3];
    for op in [
        OpKind::Abs,
        OpKind::Sqrt,
        OpKind::Exp,
        OpKind::Log,
        OpKind::Sin,
        OpKind::Cos,
        OpKind::Tan,
        OpKind::Asin,
        OpKind::Acos,
        OpKind::Atan,
        OpKind::Negation,
    ] {
        let (mut model, pid, vars) = problem_with_vars(1);
        let mut b = model.problem_builder(pid).unwrap();
        let x0 = var_node(&b, vars[0]);
        let root = b.operator(op, vec![x0]);
        check_against_finite_diff(b.graph(), root, &x);
    }
}

#[test]
fn binary_operators_match_finite_differences() {
    let x = [1.3, 0.7];
    for op in [OpKind::Division, OpKind::Power, OpKind::Product] {
        let (mut model, pid, vars) = problem_with_vars(2);
        let mut b = model.problem_builder(pid).unwrap();
        let (x0, x1) = (var_node(&b, vars[0]), var_node(&b, vars[1]));
        let root = b.operator(op, vec![x0, x1]);
        check_against_finite_diff(b.graph(), root, &x);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn dual_gradients_match_finite_differences(
        steps in prop::collection::vec(step_strategy(), 1..24),
        x in prop::collection::vec(-1.5f64..1.5, 3),
    ) {
        let (mut model, pid, vars) = problem_with_vars(3);
        let mut b = model.problem_builder(pid).unwrap();
        let leaves: Vec<NodeIdx> = vars.iter().map(|&v| var_node(&b, v)).collect();
        let root = build_steps(&mut b, &leaves, &steps);
        let graph = b.graph();

        let dual = graph
            .eval(root, &Values::<Dual>::seeded(&x), &EvalOptions { check_finite: false })
            .unwrap();
        prop_assume!(dual.value.is_finite() && dual.value.abs() < 1e3);
        for (i, &v) in vars.iter().enumerate() {
            let fd = finite_diff(graph, root, &x, i, 1e-6);
            let ad = dual.derivative(v);
            prop_assume!(ad.abs() < 1e4);
            let tol = 1e-4 * (1.0 + ad.abs().max(fd.abs()));
            prop_assert!((ad - fd).abs() <= tol, "d/dx{} ad={} fd={}", i, ad, fd);
        }
    }
}

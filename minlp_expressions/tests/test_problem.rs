mod common;

use approx::assert_relative_eq;
use common::var_node;
use minlp_expressions::{Domain, EvalOptions, Model, ModelError, OpKind, ReferenceError, Sense, VariableId};

/// min x*y + exp(z)  s.t.  x^2 + y^2 <= 4,  x - z >= 0
fn small_problem() -> (Model, minlp_expressions::ProblemId, [VariableId; 3]) {
    let mut model = Model::new();
    let pid = model.create_problem("small");
    let mut b = model.problem_builder(pid).unwrap();
    let x = b.add_variable("x", Some(-2.0), Some(2.0), Domain::Real).unwrap();
    let y = b.add_variable("y", Some(-2.0), Some(2.0), Domain::Real).unwrap();
    let z = b.add_variable("z", Some(0.0), Some(3.0), Domain::Integer).unwrap();
    let (xn, yn, zn) = (var_node(&b, x), var_node(&b, y), var_node(&b, z));

    let two = b.constant(2.0);
    let x2 = b.operator(OpKind::Power, vec![xn, two]);
    let y2 = b.operator(OpKind::Power, vec![yn, two]);
    let circle = b.operator(OpKind::Sum, vec![x2, y2]);
    b.add_constraint("circle", circle, None, Some(4.0)).unwrap();

    let diff = b.operator(
        OpKind::Linear {
            coefficients: vec![1.0, -1.0],
            constant: 0.0,
        },
        vec![xn, zn],
    );
    b.add_constraint("order", diff, Some(0.0), None).unwrap();

    let xy = b.operator(OpKind::Product, vec![xn, yn]);
    let ez = b.operator(OpKind::Exp, vec![zn]);
    let obj = b.operator(OpKind::Sum, vec![xy, ez]);
    b.add_objective("cost", obj, Sense::Minimize).unwrap();
    drop(b);
    (model, pid, [x, y, z])
}

#[test]
fn variables_are_looked_up_by_name() {
    let (model, pid, [x, _, z]) = small_problem();
    let problem = model.problem(pid).unwrap();
    assert_eq!(problem.name(), "small");
    assert_eq!(problem.num_variables(), 3);
    assert_eq!(problem.variable_by_name("x"), Some(x));
    assert_eq!(problem.variable_by_name("w"), None);
    assert_eq!(problem.variable(z).unwrap().domain, Domain::Integer);
    assert_eq!(problem.lower_bounds(), vec![Some(-2.0), Some(-2.0), Some(0.0)]);
    assert_eq!(problem.constraint_by_name("order").unwrap().lower_bound, Some(0.0));
}

#[test]
fn jacobian_and_gradient_at_a_point() {
    let (model, pid, [x, y, z]) = small_problem();
    let opts = EvalOptions::default();
    let pt = [1.5, -0.5, 1.0];

    let rows = model.constraint_jacobian(pid, &pt, &opts).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0][0].0, x);
    assert_relative_eq!(rows[0][0].1, 3.0, epsilon = 1e-12);
    assert_eq!(rows[0][1].0, y);
    assert_relative_eq!(rows[0][1].1, -1.0, epsilon = 1e-12);
    assert_eq!(rows[1], vec![(x, 1.0), (z, -1.0)]);

    let g = model.objective_gradient(pid, 0, &pt, &opts).unwrap();
    assert_eq!(g.len(), 3);
    assert_relative_eq!(g[0].1, -0.5);
    assert_relative_eq!(g[1].1, 1.5);
    assert_relative_eq!(g[2].1, 1.0f64.exp());

    let (problem, graph) = model.problem_with_graph(pid).unwrap();
    let values = problem.constraint_values(graph, &pt, &opts).unwrap();
    assert_relative_eq!(values[0], 2.5, epsilon = 1e-12);
    assert_relative_eq!(values[1], 0.5);
}

#[test]
fn bounds_can_be_tightened_and_validated() {
    let (mut model, pid, [x, _, _]) = small_problem();
    let mut b = model.problem_builder(pid).unwrap();
    b.set_bounds(x, Some(0.0), Some(1.0)).unwrap();
    assert_eq!(
        b.set_bounds(x, Some(1.0), Some(0.0)),
        Err(ModelError::InvalidBounds {
            lower: Some(1.0),
            upper: Some(0.0)
        })
    );
    assert_eq!(
        b.set_bounds(VariableId::new(9), None, None),
        Err(ModelError::UnknownVariable(VariableId::new(9)))
    );
    drop(b);
    let v = model.problem(pid).unwrap().variable(x).unwrap();
    assert_eq!((v.lower_bound, v.upper_bound), (Some(0.0), Some(1.0)));
}

#[test]
fn removed_problem_fails_every_lookup() {
    let (mut model, pid, _) = small_problem();
    model.remove_problem(pid).unwrap();
    assert_eq!(model.num_problems(), 0);
    assert!(matches!(
        model.constraint_jacobian(pid, &[0.0; 3], &EvalOptions::default()),
        Err(ModelError::Reference(ReferenceError::Freed { kind: "problem", .. }))
    ));
}

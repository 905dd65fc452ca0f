use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minlp_expressions::{
    Domain, Dual, Dual2, EvalOptions, Model, NodeIdx, OpKind, ProblemBuilder, ProblemId, Values, VariableId,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_VARIABLES: usize = 5;
const EXPR_SIZE: usize = 20;
const N_EXPRS: usize = 100;
const N_ROWS: usize = 1_000;

fn pick<R: Rng>(rng: &mut R, built: &[NodeIdx]) -> NodeIdx {
    built[rng.random_range(0..built.len())]
}

fn random_expression<R: Rng>(rng: &mut R, b: &mut ProblemBuilder<'_>, leaves: &[NodeIdx]) -> NodeIdx {
    let mut built: Vec<NodeIdx> = leaves.to_vec();
    for _ in 0..EXPR_SIZE {
        let idx = match rng.random_range(0..6) {
            0 => {
                let c = b.constant(rng.random_range(-2.0..2.0));
                let x = pick(rng, &built);
                b.operator(OpKind::Sum, vec![x, c])
            }
            1 => {
                let (l, r) = (pick(rng, &built), pick(rng, &built));
                b.operator(OpKind::Sum, vec![l, r])
            }
            2 => {
                let (l, r) = (pick(rng, &built), pick(rng, &built));
                b.operator(OpKind::Product, vec![l, r])
            }
            3 => {
                let x = pick(rng, &built);
                b.operator(OpKind::Cos, vec![x])
            }
            4 => {
                let x = pick(rng, &built);
                b.operator(OpKind::Atan, vec![x])
            }
            _ => {
                let (l, r) = (pick(rng, &built), pick(rng, &built));
                b.operator(
                    OpKind::Linear {
                        coefficients: vec![0.5, -0.5],
                        constant: 1.0,
                    },
                    vec![l, r],
                )
            }
        };
        built.push(idx);
    }
    *built.last().expect("at least one variable")
}

fn make_problem() -> (Model, ProblemId, Vec<NodeIdx>) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut model = Model::new();
    let pid = model.create_problem("bench");
    let mut b = model.problem_builder(pid).unwrap();
    let leaves: Vec<NodeIdx> = (0..N_VARIABLES)
        .map(|i| {
            let v = b.add_variable(format!("x{i}"), None, None, Domain::Real).unwrap();
            b.variable_node(v).unwrap()
        })
        .collect();
    let roots = (0..N_EXPRS)
        .map(|_| random_expression(&mut rng, &mut b, &leaves))
        .collect();
    drop(b);
    (model, pid, roots)
}

fn make_data() -> Array2<f64> {
    Array2::from_shape_fn((N_VARIABLES, N_ROWS), |(v, row)| (row as f64 * 0.01) + (v as f64 * 0.1))
}

fn bench_eval(c: &mut Criterion) {
    let (model, pid, roots) = make_problem();
    let (_, graph) = model.problem_with_graph(pid).unwrap();
    let x = make_data();
    let opts = EvalOptions { check_finite: false };
    let point: Vec<f64> = (0..N_VARIABLES).map(|i| 0.1 * i as f64).collect();

    let mut group = c.benchmark_group("evaluation");
    group.bench_function(BenchmarkId::from_parameter("graph_f64"), |b| {
        let values = Values::from_slice(&point);
        b.iter(|| {
            for &root in &roots {
                let _ = graph.eval(root, &values, &opts);
            }
        })
    });
    group.bench_function(BenchmarkId::from_parameter("graph_dual"), |b| {
        let values = Values::<Dual>::seeded(&point);
        b.iter(|| {
            for &root in &roots {
                let _ = graph.eval(root, &values, &opts);
            }
        })
    });

    let compiled: Vec<_> = roots
        .iter()
        .map(|&root| graph.node(root).expression_tree_data(graph, N_VARIABLES))
        .collect();
    group.bench_function(BenchmarkId::from_parameter("tree_data_rows"), |b| {
        b.iter(|| {
            for data in &compiled {
                let _ = data.eval_rows(x.view(), &opts);
            }
        })
    });
    group.bench_function(BenchmarkId::from_parameter("compile"), |b| {
        b.iter(|| {
            for &root in &roots {
                let _ = graph.node(root).expression_tree_data(graph, N_VARIABLES);
            }
        })
    });
    group.finish();

    let mut group = c.benchmark_group("derivatives");
    let points: Vec<Values<Dual>> = (0..N_ROWS)
        .map(|row| {
            Values::seeded(&(0..N_VARIABLES).map(|v| x[[v, row]]).collect::<Vec<_>>())
        })
        .collect();
    group.bench_function(BenchmarkId::from_parameter("points_par"), |b| {
        b.iter(|| compiled[0].eval_points_par(&points, &opts))
    });
    group.bench_function(BenchmarkId::from_parameter("gradient_first_var"), |b| {
        b.iter(|| {
            roots
                .iter()
                .filter_map(|&root| graph.eval(root, &points[0], &opts).ok())
                .map(|d| d.derivative(VariableId::new(0)))
                .sum::<f64>()
        })
    });
    let second_order = Values::<Dual2>::seeded(&(0..N_VARIABLES).map(|v| x[[v, 0]]).collect::<Vec<_>>());
    group.bench_function(BenchmarkId::from_parameter("hessian"), |b| {
        b.iter(|| {
            roots
                .iter()
                .filter_map(|&root| graph.eval(root, &second_order, &opts).ok())
                .map(|d| d.hessian.len())
                .sum::<usize>()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);

pub mod algebra;
pub mod arena;
pub mod compile;
pub mod degree;
pub mod error;
pub mod evaluate;
pub mod graph;
pub mod hessian;
pub mod jacobian;
pub mod model;
pub mod node;
pub mod operators;
pub mod problem;
pub mod uid;
pub mod values;

pub use {num_traits, paste};

pub use crate::algebra::{Algebra, Dual, Dual2, Gradient, Hessian};
pub use crate::arena::{Arena, ArenaKey, GraphId, ProblemId, SlotKey};
pub use crate::compile::{Instr, Src, TreeData};
pub use crate::degree::PolynomialDegree;
pub use crate::error::{EvalError, EvalResult, ModelError, ReferenceError};
pub use crate::evaluate::EvalOptions;
pub use crate::graph::Graph;
pub use crate::hessian::SparseHessian;
pub use crate::jacobian::SparseRow;
pub use crate::model::Model;
pub use crate::node::{DEFAULT_DEPTH, Node, NodeIdx, NodeKind, VariableId};
pub use crate::operators::{Arity, OpKind};
pub use crate::problem::{Constraint, Domain, Objective, Problem, ProblemBuilder, Sense, Variable};
pub use crate::uid::{Uid, UidGenerator};
pub use crate::values::Values;

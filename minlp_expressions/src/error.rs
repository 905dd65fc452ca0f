use thiserror::Error;

use crate::node::{NodeIdx, VariableId};

pub type EvalResult<T> = Result<T, EvalError>;

/// Recoverable evaluation failure. The caller decides whether the point is discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("variable {variable} has no value in the assignment (needed by node {node})")]
    UnboundVariable { variable: VariableId, node: NodeIdx },

    #[error("{op} at node {node} produced a non-finite result ({value})")]
    NonFinite {
        node: NodeIdx,
        op: &'static str,
        value: f64,
    },
}

/// A back-reference that cannot be resolved through the model's arenas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("node is not attached to a {0}")]
    Unset(&'static str),

    #[error("{kind} {slot} has been freed")]
    Freed { kind: &'static str, slot: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("a {kind} named {name:?} already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("node {0} does not belong to this problem's graph")]
    ForeignNode(NodeIdx),

    #[error("unknown variable {0}")]
    UnknownVariable(VariableId),

    #[error("problem has no objective #{0}")]
    UnknownObjective(usize),

    #[error("invalid bounds [{lower:?}, {upper:?}]")]
    InvalidBounds { lower: Option<f64>, upper: Option<f64> },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

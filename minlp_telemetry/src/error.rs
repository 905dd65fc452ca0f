use std::io;

use thiserror::Error;

use crate::coordinate::Coordinate;

pub type WireResult<T> = Result<T, WireError>;

/// Malformed or truncated wire data.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("input ended in the middle of a {0}")]
    Truncated(&'static str),

    #[error("varint is longer than 10 bytes")]
    VarintOverflow,

    #[error("field number 0 is reserved")]
    ZeroFieldNumber,

    #[error("unsupported wire type {wire_type} for field {field}")]
    InvalidWireType { field: u32, wire_type: u8 },

    #[error("string field {field} is not valid UTF-8")]
    InvalidUtf8 { field: u32 },

    #[error("length {len} of field {field} exceeds the remaining {remaining} bytes")]
    LengthOutOfBounds { field: u32, len: u64, remaining: usize },

    #[error("message carries no payload")]
    MissingPayload,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A B&B event that contradicts the events seen before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("node {0} was already added")]
    DuplicateNode(Coordinate),

    #[error("node {0} was added before its parent")]
    OrphanNode(Coordinate),

    #[error("prune of node {0}, which was never added")]
    UnknownNode(Coordinate),

    #[error("node {0} was already pruned")]
    AlreadyPruned(Coordinate),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid telemetry options: {0}")]
    Options(#[from] serde_json::Error),
}

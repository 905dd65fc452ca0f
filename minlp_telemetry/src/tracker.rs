use std::collections::BTreeMap;

use tracing::trace;

use crate::coordinate::Coordinate;
use crate::error::ProtocolError;
use crate::message::Payload;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    Open,
    Pruned,
}

/// Add/prune bookkeeping for one search tree.
///
/// A node may be added once, only after its parent (the root has none), and pruned once after it
/// was added. Children may still be added below a pruned node, since branching is announced before
/// the parent is closed.
#[derive(Clone, Debug, Default)]
pub struct BabNodeTracker {
    nodes: BTreeMap<Coordinate, NodeState>,
    open: usize,
}

impl BabNodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_add(&self, coordinate: &Coordinate) -> Result<(), ProtocolError> {
        if self.nodes.contains_key(coordinate) {
            return Err(ProtocolError::DuplicateNode(coordinate.clone()));
        }
        if let Some(parent) = coordinate.parent() {
            if !self.nodes.contains_key(&parent) {
                return Err(ProtocolError::OrphanNode(coordinate.clone()));
            }
        }
        Ok(())
    }

    fn check_prune(&self, coordinate: &Coordinate) -> Result<(), ProtocolError> {
        match self.nodes.get(coordinate) {
            None => Err(ProtocolError::UnknownNode(coordinate.clone())),
            Some(NodeState::Pruned) => Err(ProtocolError::AlreadyPruned(coordinate.clone())),
            Some(NodeState::Open) => Ok(()),
        }
    }

    pub fn add(&mut self, coordinate: &Coordinate) -> Result<(), ProtocolError> {
        self.check_add(coordinate)?;
        trace!(%coordinate, "node added");
        self.nodes.insert(coordinate.clone(), NodeState::Open);
        self.open += 1;
        Ok(())
    }

    pub fn prune(&mut self, coordinate: &Coordinate) -> Result<(), ProtocolError> {
        self.check_prune(coordinate)?;
        self.nodes.insert(coordinate.clone(), NodeState::Pruned);
        self.open -= 1;
        trace!(%coordinate, "node pruned");
        Ok(())
    }

    /// Whether [`apply`](Self::apply) would accept `payload`, without recording it.
    pub fn check(&self, payload: &Payload) -> Result<(), ProtocolError> {
        match payload {
            Payload::AddBabNode(d) => self.check_add(&d.coordinate),
            Payload::PruneBabNode(p) => self.check_prune(&p.coordinate),
            _ => Ok(()),
        }
    }

    /// Apply the B&B part of a payload; other payloads are accepted unchanged. A rejected payload
    /// leaves the tracker as it was.
    pub fn apply(&mut self, payload: &Payload) -> Result<(), ProtocolError> {
        match payload {
            Payload::AddBabNode(d) => self.add(&d.coordinate),
            Payload::PruneBabNode(p) => self.prune(&p.coordinate),
            _ => Ok(()),
        }
    }

    pub fn state(&self, coordinate: &Coordinate) -> Option<NodeState> {
        self.nodes.get(coordinate).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn num_open(&self) -> usize {
        self.open
    }

    pub fn num_pruned(&self) -> usize {
        self.nodes.len() - self.open
    }

    /// Open nodes in coordinate order.
    pub fn open_nodes(&self) -> impl Iterator<Item = &Coordinate> {
        self.nodes
            .iter()
            .filter(|&(_, &s)| s == NodeState::Open)
            .map(|(c, _)| c)
    }
}

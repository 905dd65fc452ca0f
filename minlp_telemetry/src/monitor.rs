use std::collections::BTreeMap;
use std::io::Read;

use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::message::{Message, Payload};
use crate::reader::MessageReader;
use crate::tracker::BabNodeTracker;

/// What the monitor knows about one solver run.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    pub tracker: BabNodeTracker,
    pub solver: Option<String>,
    pub finished: bool,
    pub messages: u64,
    pub last_timestamp: u64,
    /// Latest value reported per tracked quantity.
    pub variables: BTreeMap<String, f64>,
}

/// A protocol violation together with the run and message that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub run_id: String,
    pub timestamp: u64,
    pub error: ProtocolError,
}

/// Consumer-side replay of telemetry streams.
///
/// Runs are kept apart by `run_id`. Protocol violations are collected rather than raised, so a
/// misbehaving producer never stops the replay.
#[derive(Debug, Default)]
pub struct Monitor {
    runs: BTreeMap<String, RunState>,
    violations: Vec<Violation>,
    malformed: usize,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, msg: &Message) {
        let run = self.runs.entry(msg.run_id.clone()).or_default();
        run.messages += 1;
        run.last_timestamp = run.last_timestamp.max(msg.timestamp);

        match &msg.payload {
            Payload::SolveStart(e) => run.solver = Some(e.solver.clone()),
            Payload::SolveEnd(_) => run.finished = true,
            Payload::UpdateVariable(u) => {
                run.variables.insert(u.name.clone(), u.value);
            }
            _ => {}
        }

        if let Err(error) = run.tracker.apply(&msg.payload) {
            warn!(run_id = %msg.run_id, %error, "protocol violation");
            self.violations.push(Violation {
                run_id: msg.run_id.clone(),
                timestamp: msg.timestamp,
                error,
            });
        }
    }

    /// Observe every message of a framed stream. Malformed frames are counted and skipped; the
    /// replay stops at the end of the stream or at the first error it cannot resume from.
    pub fn replay<R: Read>(&mut self, reader: MessageReader<R>) -> usize {
        let mut observed = 0;
        for item in reader {
            match item {
                Ok(msg) => {
                    self.observe(&msg);
                    observed += 1;
                }
                Err(err) => {
                    self.malformed += 1;
                    warn!(%err, "malformed telemetry frame");
                }
            }
        }
        debug!(observed, malformed = self.malformed, "replay finished");
        observed
    }

    pub fn run(&self, run_id: &str) -> Option<&RunState> {
        self.runs.get(run_id)
    }

    pub fn runs(&self) -> impl Iterator<Item = (&str, &RunState)> {
        self.runs.iter().map(|(id, run)| (id.as_str(), run))
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Frames that could not be decoded.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;
    use crate::descriptor::BabNodeDescriptor;

    fn at(run_id: &str, timestamp: u64, payload: Payload) -> Message {
        Message {
            name: "n".into(),
            run_id: run_id.into(),
            timestamp,
            payload,
        }
    }

    #[test]
    fn runs_are_tracked_independently() {
        let mut m = Monitor::new();
        let root = || Payload::AddBabNode(BabNodeDescriptor::new(Coordinate::root(), 0.0, 1.0));
        m.observe(&at("a", 1, root()));
        m.observe(&at("b", 2, root()));
        m.observe(&at("a", 3, Payload::prune(Coordinate::root())));
        m.observe(&at("a", 4, Payload::prune(Coordinate::root())));

        assert_eq!(m.run("a").unwrap().tracker.num_pruned(), 1);
        assert_eq!(m.run("b").unwrap().tracker.num_open(), 1);
        assert_eq!(
            m.violations(),
            &[Violation {
                run_id: "a".into(),
                timestamp: 4,
                error: ProtocolError::AlreadyPruned(Coordinate::root()),
            }]
        );
        assert_eq!(m.run("a").unwrap().last_timestamp, 4);
    }
}

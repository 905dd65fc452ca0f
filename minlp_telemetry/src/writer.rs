use std::io::Write;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::coordinate::Coordinate;
use crate::descriptor::BabNodeDescriptor;
use crate::error::TelemetryError;
use crate::message::{Message, Payload, SolverEvent, TensorMessage, TextMessage, UpdateVariable};
use crate::options::TelemetryOptions;
use crate::tracker::BabNodeTracker;
use crate::wire::put_varint;

/// Append one length-prefixed frame to `buf`.
pub fn encode_frame(msg: &Message, buf: &mut Vec<u8>) {
    let body = msg.encode();
    put_varint(buf, body.len() as u64);
    buf.extend_from_slice(&body);
}

/// Solver-side telemetry producer.
///
/// Every call stamps a message with the configured name, run id and the clock's current time, and
/// appends it to the sink as one frame. With `validate_protocol` on, add/prune events that
/// contradict earlier ones are still written, so the consumer sees them, and are then returned as
/// [`TelemetryError::Protocol`]. The writer's own tracker only records events that were accepted
/// and reached the sink.
pub struct TelemetryWriter<W: Write, C: Clock = SystemClock> {
    sink: W,
    clock: C,
    options: TelemetryOptions,
    tracker: BabNodeTracker,
    frame: Vec<u8>,
    written: u64,
}

impl<W: Write> TelemetryWriter<W, SystemClock> {
    pub fn new(sink: W, options: TelemetryOptions) -> Self {
        Self::with_clock(sink, SystemClock, options)
    }
}

impl<W: Write, C: Clock> TelemetryWriter<W, C> {
    pub fn with_clock(sink: W, clock: C, options: TelemetryOptions) -> Self {
        Self {
            sink,
            clock,
            options,
            tracker: BabNodeTracker::new(),
            frame: Vec::new(),
            written: 0,
        }
    }

    pub fn options(&self) -> &TelemetryOptions {
        &self.options
    }

    pub fn tracker(&self) -> &BabNodeTracker {
        &self.tracker
    }

    /// Messages written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), TelemetryError> {
        Ok(self.sink.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit(&mut self, payload: Payload) -> Result<(), TelemetryError> {
        if !self.options.enabled {
            return Ok(());
        }
        let verdict = if self.options.validate_protocol {
            self.tracker.check(&payload)
        } else {
            Ok(())
        };
        let msg = Message {
            name: self.options.name.clone(),
            run_id: self.options.run_id.clone(),
            timestamp: self.clock.now_millis(),
            payload,
        };
        self.frame.clear();
        encode_frame(&msg, &mut self.frame);
        self.sink.write_all(&self.frame)?;
        self.written += 1;
        debug!(kind = msg.payload.kind(), bytes = self.frame.len(), "telemetry message written");

        if let Err(err) = verdict {
            warn!(run_id = %self.options.run_id, %err, "telemetry event violates the node protocol");
            return Err(err.into());
        }
        if self.options.validate_protocol {
            self.tracker.apply(&msg.payload)?;
        }
        Ok(())
    }

    pub fn text(&mut self, level: u32, content: impl Into<String>) -> Result<(), TelemetryError> {
        self.emit(Payload::Text(TextMessage {
            level,
            content: content.into(),
        }))
    }

    pub fn tensor(
        &mut self,
        filename: impl Into<String>,
        group: impl Into<String>,
        dataset: impl Into<String>,
        sizes: Vec<i32>,
    ) -> Result<(), TelemetryError> {
        self.emit(Payload::Tensor(TensorMessage {
            filename: filename.into(),
            group: group.into(),
            dataset: dataset.into(),
            sizes,
        }))
    }

    /// Announce an array stored for a B&B node; the group is the node's coordinate.
    pub fn node_tensor(
        &mut self,
        filename: impl Into<String>,
        coordinate: &Coordinate,
        dataset: impl Into<String>,
        sizes: Vec<i32>,
    ) -> Result<(), TelemetryError> {
        self.tensor(filename, coordinate.to_string(), dataset, sizes)
    }

    pub fn solve_start(&mut self, solver: impl Into<String>) -> Result<(), TelemetryError> {
        self.emit(Payload::SolveStart(SolverEvent { solver: solver.into() }))
    }

    pub fn solve_end(&mut self, solver: impl Into<String>) -> Result<(), TelemetryError> {
        self.emit(Payload::SolveEnd(SolverEvent { solver: solver.into() }))
    }

    pub fn update_variable(
        &mut self,
        name: impl Into<String>,
        iteration: Vec<u32>,
        value: f64,
    ) -> Result<(), TelemetryError> {
        self.emit(Payload::UpdateVariable(UpdateVariable {
            name: name.into(),
            iteration,
            value,
        }))
    }

    pub fn add_bab_node(&mut self, descriptor: BabNodeDescriptor) -> Result<(), TelemetryError> {
        self.emit(Payload::AddBabNode(descriptor))
    }

    pub fn prune_bab_node(&mut self, coordinate: impl Into<Coordinate>) -> Result<(), TelemetryError> {
        self.emit(Payload::prune(coordinate))
    }
}

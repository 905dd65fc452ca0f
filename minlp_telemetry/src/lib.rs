pub mod clock;
pub mod coordinate;
pub mod descriptor;
pub mod error;
pub mod message;
pub mod monitor;
pub mod options;
pub mod reader;
pub mod tracker;
pub mod wire;
pub mod writer;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::coordinate::Coordinate;
pub use crate::descriptor::{BabNodeDescriptor, PruneBabNode, VariableInformation};
pub use crate::error::{ProtocolError, TelemetryError, WireError, WireResult};
pub use crate::message::{Message, Payload, SolverEvent, TensorMessage, TextMessage, UpdateVariable};
pub use crate::monitor::{Monitor, RunState, Violation};
pub use crate::options::TelemetryOptions;
pub use crate::reader::MessageReader;
pub use crate::tracker::{BabNodeTracker, NodeState};
pub use crate::wire::{Decoder, Encoder, WireMessage, WireType};
pub use crate::writer::{TelemetryWriter, encode_frame};

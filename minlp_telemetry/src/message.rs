use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::descriptor::{BabNodeDescriptor, PruneBabNode};
use crate::error::{WireError, WireResult};
use crate::wire::{Decoder, Encoder, WireMessage, WireType};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub level: u32,
    pub content: String,
}

impl WireMessage for TextMessage {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.uint32(1, self.level);
        enc.string(2, &self.content);
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::Varint) => self.level = dec.uint32()?,
            (2, WireType::LengthDelimited) => self.content = dec.string(field)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Reference to an array dumped to an external file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorMessage {
    pub filename: String,
    pub group: String,
    pub dataset: String,
    pub sizes: Vec<i32>,
}

impl WireMessage for TensorMessage {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.filename);
        enc.string(2, &self.group);
        enc.string(3, &self.dataset);
        enc.packed_int32(4, &self.sizes);
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => self.filename = dec.string(field)?,
            (2, WireType::LengthDelimited) => self.group = dec.string(field)?,
            (3, WireType::LengthDelimited) => self.dataset = dec.string(field)?,
            (4, WireType::Varint | WireType::LengthDelimited) => dec.repeated_int32(field, wire_type, &mut self.sizes)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Body shared by solve-start and solve-end events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverEvent {
    pub solver: String,
}

impl WireMessage for SolverEvent {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.solver);
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => {
                self.solver = dec.string(field)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVariable {
    pub name: String,
    pub iteration: Vec<u32>,
    pub value: f64,
}

impl WireMessage for UpdateVariable {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.name);
        enc.packed_uint32(2, &self.iteration);
        enc.double(3, self.value);
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => self.name = dec.string(field)?,
            (2, WireType::Varint | WireType::LengthDelimited) => {
                dec.repeated_uint32(field, wire_type, &mut self.iteration)?
            }
            (3, WireType::Fixed64) => self.value = dec.double()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Text(TextMessage),
    Tensor(TensorMessage),
    SolveStart(SolverEvent),
    SolveEnd(SolverEvent),
    UpdateVariable(UpdateVariable),
    AddBabNode(BabNodeDescriptor),
    PruneBabNode(PruneBabNode),
}

impl Payload {
    pub const fn field(&self) -> u32 {
        match self {
            Payload::Text(_) => 10,
            Payload::Tensor(_) => 11,
            Payload::SolveStart(_) => 12,
            Payload::SolveEnd(_) => 13,
            Payload::UpdateVariable(_) => 14,
            Payload::AddBabNode(_) => 15,
            Payload::PruneBabNode(_) => 16,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Tensor(_) => "tensor",
            Payload::SolveStart(_) => "solve_start",
            Payload::SolveEnd(_) => "solve_end",
            Payload::UpdateVariable(_) => "update_variable",
            Payload::AddBabNode(_) => "add_bab_node",
            Payload::PruneBabNode(_) => "prune_bab_node",
        }
    }

    pub fn prune(coordinate: impl Into<Coordinate>) -> Self {
        Payload::PruneBabNode(PruneBabNode {
            coordinate: coordinate.into(),
        })
    }

    fn encode(&self, enc: &mut Encoder) {
        let field = self.field();
        match self {
            Payload::Text(m) => enc.message(field, m),
            Payload::Tensor(m) => enc.message(field, m),
            Payload::SolveStart(m) | Payload::SolveEnd(m) => enc.message(field, m),
            Payload::UpdateVariable(m) => enc.message(field, m),
            Payload::AddBabNode(m) => enc.message(field, m),
            Payload::PruneBabNode(m) => enc.message(field, m),
        }
    }

    fn decode(field: u32, dec: &mut Decoder<'_>) -> WireResult<Option<Self>> {
        let payload = match field {
            10 => Payload::Text(dec.message(field)?),
            11 => Payload::Tensor(dec.message(field)?),
            12 => Payload::SolveStart(dec.message(field)?),
            13 => Payload::SolveEnd(dec.message(field)?),
            14 => Payload::UpdateVariable(dec.message(field)?),
            15 => Payload::AddBabNode(dec.message(field)?),
            16 => Payload::PruneBabNode(dec.message(field)?),
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }
}

/// Telemetry envelope. Exactly one payload per message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub run_id: String,
    pub timestamp: u64,
    pub payload: Payload,
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.string(1, &self.name);
        enc.string(2, &self.run_id);
        enc.uint64(3, self.timestamp);
        self.payload.encode(&mut enc);
        enc.into_bytes()
    }

    /// When several payload fields are present the last one wins.
    pub fn decode(buf: &[u8]) -> WireResult<Self> {
        let mut name = String::new();
        let mut run_id = String::new();
        let mut timestamp = 0;
        let mut payload = None;

        let mut dec = Decoder::new(buf);
        while let Some((field, wire_type)) = dec.key()? {
            match (field, wire_type) {
                (1, WireType::LengthDelimited) => name = dec.string(field)?,
                (2, WireType::LengthDelimited) => run_id = dec.string(field)?,
                (3, WireType::Varint) => timestamp = dec.varint()?,
                (10..=16, WireType::LengthDelimited) => payload = Payload::decode(field, &mut dec)?,
                _ => dec.skip(field, wire_type)?,
            }
        }

        Ok(Self {
            name,
            run_id,
            timestamp,
            payload: payload.ok_or(WireError::MissingPayload)?,
        })
    }
}

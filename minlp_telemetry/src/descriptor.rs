use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::WireResult;
use crate::wire::{Decoder, Encoder, WireMessage, WireType};

/// Bounds one variable holds at a search-tree node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableInformation {
    pub variable_name: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl VariableInformation {
    pub fn new(variable_name: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            variable_name: variable_name.into(),
            lower_bound,
            upper_bound,
        }
    }
}

impl WireMessage for VariableInformation {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.variable_name);
        enc.double(2, self.lower_bound);
        enc.double(3, self.upper_bound);
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => self.variable_name = dec.string(field)?,
            (2, WireType::Fixed64) => self.lower_bound = dec.double()?,
            (3, WireType::Fixed64) => self.upper_bound = dec.double()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// A branch-and-bound node as announced to the monitor: where it sits in the tree, the bound
/// interval of its relaxation, and the variable bounds in force there.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BabNodeDescriptor {
    pub coordinate: Coordinate,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub variables_information: Vec<VariableInformation>,
}

impl BabNodeDescriptor {
    pub fn new(coordinate: impl Into<Coordinate>, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            coordinate: coordinate.into(),
            lower_bound,
            upper_bound,
            variables_information: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Self {
        self.variables_information
            .push(VariableInformation::new(name, lower_bound, upper_bound));
        self
    }
}

impl WireMessage for BabNodeDescriptor {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.packed_uint32(1, self.coordinate.as_slice());
        enc.double(2, self.lower_bound);
        enc.double(3, self.upper_bound);
        for info in &self.variables_information {
            enc.message(4, info);
        }
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::Varint | WireType::LengthDelimited) => {
                let mut path = std::mem::take(&mut self.coordinate).into_vec();
                dec.repeated_uint32(field, wire_type, &mut path)?;
                self.coordinate = Coordinate::from(path);
            }
            (2, WireType::Fixed64) => self.lower_bound = dec.double()?,
            (3, WireType::Fixed64) => self.upper_bound = dec.double()?,
            (4, WireType::LengthDelimited) => self.variables_information.push(dec.message(field)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Body of a prune event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PruneBabNode {
    pub coordinate: Coordinate,
}

impl WireMessage for PruneBabNode {
    fn encode_fields(&self, enc: &mut Encoder) {
        enc.packed_uint32(1, self.coordinate.as_slice());
    }

    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool> {
        match (field, wire_type) {
            (1, WireType::Varint | WireType::LengthDelimited) => {
                let mut path = std::mem::take(&mut self.coordinate).into_vec();
                dec.repeated_uint32(field, wire_type, &mut path)?;
                self.coordinate = Coordinate::from(path);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

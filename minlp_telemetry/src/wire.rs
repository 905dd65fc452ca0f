//! Protobuf-compatible field codec.
//!
//! Only the subset the telemetry messages need: varint scalars, little-endian doubles, strings,
//! packed repeated 32-bit integers and nested messages. Unknown fields of any standard wire type
//! are skipped on decode.

use crate::error::{WireError, WireResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    pub const fn bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }

    fn from_bits(field: u32, bits: u8) -> WireResult<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            wire_type => Err(WireError::InvalidWireType { field, wire_type }),
        }
    }
}

pub fn put_varint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

pub fn varint_len(v: u64) -> usize {
    (64 - (v | 1).leading_zeros() as usize).div_ceil(7)
}

/// Append-only field writer.
///
/// Scalar helpers other than [`Encoder::double`] skip default values, as proto3 does.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn key(&mut self, field: u32, wire_type: WireType) {
        debug_assert!(field > 0);
        put_varint(&mut self.buf, (u64::from(field) << 3) | u64::from(wire_type.bits()));
    }

    pub fn uint32(&mut self, field: u32, v: u32) {
        self.uint64(field, u64::from(v));
    }

    pub fn uint64(&mut self, field: u32, v: u64) {
        if v != 0 {
            self.key(field, WireType::Varint);
            put_varint(&mut self.buf, v);
        }
    }

    /// Negative values are sign-extended to ten bytes.
    pub fn int32(&mut self, field: u32, v: i32) {
        if v != 0 {
            self.key(field, WireType::Varint);
            put_varint(&mut self.buf, i64::from(v) as u64);
        }
    }

    /// Always written, so that `0.0` and `-0.0` survive a round trip.
    pub fn double(&mut self, field: u32, v: f64) {
        self.key(field, WireType::Fixed64);
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn string(&mut self, field: u32, s: &str) {
        if !s.is_empty() {
            self.bytes(field, s.as_bytes());
        }
    }

    fn bytes(&mut self, field: u32, bytes: &[u8]) {
        self.key(field, WireType::LengthDelimited);
        put_varint(&mut self.buf, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn packed_uint32(&mut self, field: u32, values: &[u32]) {
        if values.is_empty() {
            return;
        }
        let len: usize = values.iter().map(|&v| varint_len(u64::from(v))).sum();
        self.key(field, WireType::LengthDelimited);
        put_varint(&mut self.buf, len as u64);
        for &v in values {
            put_varint(&mut self.buf, u64::from(v));
        }
    }

    pub fn packed_int32(&mut self, field: u32, values: &[i32]) {
        if values.is_empty() {
            return;
        }
        let len: usize = values.iter().map(|&v| varint_len(i64::from(v) as u64)).sum();
        self.key(field, WireType::LengthDelimited);
        put_varint(&mut self.buf, len as u64);
        for &v in values {
            put_varint(&mut self.buf, i64::from(v) as u64);
        }
    }

    /// Nested messages are written even when empty.
    pub fn message<M: WireMessage + ?Sized>(&mut self, field: u32, msg: &M) {
        let mut inner = Encoder::new();
        msg.encode_fields(&mut inner);
        self.bytes(field, &inner.buf);
    }
}

/// Cursor over an encoded message.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn varint(&mut self) -> WireResult<u64> {
        let mut value: u64 = 0;
        for i in 0..10 {
            let byte = *self.buf.get(self.pos).ok_or(WireError::Truncated("varint"))?;
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow)
    }

    /// Next field key, or `None` at the end of the message.
    pub fn key(&mut self) -> WireResult<Option<(u32, WireType)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.varint()?;
        let field = (key >> 3) as u32;
        if field == 0 {
            return Err(WireError::ZeroFieldNumber);
        }
        let wire_type = WireType::from_bits(field, (key & 0x7) as u8)?;
        Ok(Some((field, wire_type)))
    }

    fn take(&mut self, n: usize, what: &'static str) -> WireResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(WireError::Truncated(what));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn fixed64(&mut self) -> WireResult<u64> {
        let bytes = self.take(8, "fixed64")?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn double(&mut self) -> WireResult<f64> {
        self.fixed64().map(f64::from_bits)
    }

    /// Body of a length-delimited field.
    pub fn length_delimited(&mut self, field: u32) -> WireResult<&'a [u8]> {
        let len = self.varint()?;
        let remaining = self.remaining();
        if len > remaining as u64 {
            return Err(WireError::LengthOutOfBounds { field, len, remaining });
        }
        self.take(len as usize, "length-delimited field")
    }

    pub fn string(&mut self, field: u32) -> WireResult<String> {
        let bytes = self.length_delimited(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8 { field })
    }

    /// Out-of-range values are truncated to 32 bits, as protobuf decoders do.
    pub fn uint32(&mut self) -> WireResult<u32> {
        self.varint().map(|v| v as u32)
    }

    pub fn int32(&mut self) -> WireResult<i32> {
        self.varint().map(|v| v as i32)
    }

    /// Repeated scalar in either packed or unpacked form; appends to `out`.
    pub fn repeated_uint32(&mut self, field: u32, wire_type: WireType, out: &mut Vec<u32>) -> WireResult<()> {
        self.repeated_varint(field, wire_type, out, |v| v as u32)
    }

    pub fn repeated_int32(&mut self, field: u32, wire_type: WireType, out: &mut Vec<i32>) -> WireResult<()> {
        self.repeated_varint(field, wire_type, out, |v| v as i32)
    }

    fn repeated_varint<T>(
        &mut self,
        field: u32,
        wire_type: WireType,
        out: &mut Vec<T>,
        convert: impl Fn(u64) -> T,
    ) -> WireResult<()> {
        match wire_type {
            WireType::Varint => out.push(convert(self.varint()?)),
            WireType::LengthDelimited => {
                let mut packed = Decoder::new(self.length_delimited(field)?);
                while !packed.is_empty() {
                    out.push(convert(packed.varint()?));
                }
            }
            wire_type => {
                return Err(WireError::InvalidWireType {
                    field,
                    wire_type: wire_type.bits(),
                });
            }
        }
        Ok(())
    }

    pub fn message<M: WireMessage + Default>(&mut self, field: u32) -> WireResult<M> {
        M::decode(self.length_delimited(field)?)
    }

    pub fn skip(&mut self, field: u32, wire_type: WireType) -> WireResult<()> {
        match wire_type {
            WireType::Varint => self.varint().map(drop),
            WireType::Fixed64 => self.take(8, "fixed64").map(drop),
            WireType::Fixed32 => self.take(4, "fixed32").map(drop),
            WireType::LengthDelimited => self.length_delimited(field).map(drop),
        }
    }
}

/// A message with protobuf field layout.
///
/// Implementors write their fields in ascending field order and merge fields one at a time on
/// decode; fields they do not know are skipped by the caller.
pub trait WireMessage {
    fn encode_fields(&self, enc: &mut Encoder);

    /// Consume one field. Returns `false` when the field is not part of this message, in which
    /// case the caller skips it.
    fn merge_field(&mut self, field: u32, wire_type: WireType, dec: &mut Decoder<'_>) -> WireResult<bool>;

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode_fields(&mut enc);
        enc.into_bytes()
    }

    fn decode(buf: &[u8]) -> WireResult<Self>
    where
        Self: Default + Sized,
    {
        let mut msg = Self::default();
        let mut dec = Decoder::new(buf);
        while let Some((field, wire_type)) = dec.key()? {
            if !msg.merge_field(field, wire_type, &mut dec)? {
                dec.skip(field, wire_type)?;
            }
        }
        Ok(msg)
    }
}

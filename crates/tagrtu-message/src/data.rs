//! Data collections carried in message bodies.
//!
//! Registers travel big-endian on the wire. Decoding comes in two flavours:
//! [`Strict`] pairs bytes into registers and refuses odd lengths, while
//! [`Lenient`] widens every byte into its own register. Lenient collections
//! therefore do not round-trip: encoding one yields two bytes per register.

use std::fmt;
use std::marker::PhantomData;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MessageError, Result};

/// A collection that can be written into a message frame.
pub trait DataCollection {
    /// The collection in network byte order.
    fn network_bytes(&self) -> Bytes;

    /// Number of bytes `network_bytes` produces.
    fn byte_count(&self) -> usize;
}

/// How raw bytes become register values.
pub trait RegisterDecoding {
    fn decode(bytes: &[u8]) -> Result<Vec<i16>>;
}

/// Two bytes per register, big-endian; odd lengths are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strict;

/// One byte per register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lenient;

impl RegisterDecoding for Strict {
    fn decode(bytes: &[u8]) -> Result<Vec<i16>> {
        if bytes.len() % 2 != 0 {
            return Err(MessageError::OddByteCount(bytes.len()));
        }
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }
}

impl RegisterDecoding for Lenient {
    fn decode(bytes: &[u8]) -> Result<Vec<i16>> {
        Ok(bytes.iter().map(|&b| i16::from(b)).collect())
    }
}

/// Signed 16-bit registers decoded with strategy `S`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registers<S> {
    values: Vec<i16>,
    _decoding: PhantomData<S>,
}

/// Registers decoded in pairs.
pub type RegisterCollection = Registers<Strict>;

/// Registers decoded one byte each.
pub type LenientRegisterCollection = Registers<Lenient>;

impl<S: RegisterDecoding> Registers<S> {
    pub fn new(values: Vec<i16>) -> Self {
        Self {
            values,
            _decoding: PhantomData,
        }
    }

    /// Decode registers from bytes received off the wire.
    pub fn from_network_bytes(bytes: &[u8]) -> Result<Self> {
        S::decode(bytes).map(Self::new)
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: i16) {
        self.values.push(value);
    }

    pub fn into_vec(self) -> Vec<i16> {
        self.values
    }
}

impl<S: RegisterDecoding> DataCollection for Registers<S> {
    fn network_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.byte_count());
        for value in &self.values {
            out.put_i16(*value);
        }
        out.freeze()
    }

    fn byte_count(&self) -> usize {
        self.values.len() * 2
    }
}

impl<S: RegisterDecoding> From<Vec<i16>> for Registers<S> {
    fn from(values: Vec<i16>) -> Self {
        Self::new(values)
    }
}

impl<S: RegisterDecoding> FromIterator<i16> for Registers<S> {
    fn from_iter<I: IntoIterator<Item = i16>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<S> fmt::Display for Registers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_braced(f, &self.values)
    }
}

/// Raw bytes sent as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteCollection {
    bytes: Vec<u8>,
}

impl ByteCollection {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }
}

impl DataCollection for ByteCollection {
    fn network_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bytes)
    }

    fn byte_count(&self) -> usize {
        self.bytes.len()
    }
}

impl From<&[u8]> for ByteCollection {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for ByteCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_braced(f, &self.bytes)
    }
}

fn write_braced<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    f.write_str("{")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("}")
}

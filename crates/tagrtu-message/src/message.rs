//! Messages exchanged over a tag-framed link.
//!
//! The custom request and response carry no slave address or function code
//! of their own: the request body is sent verbatim and the whole response
//! body is treated as data. [`ReadHoldingInputRegistersResponse`] keeps the
//! standard `[slave, function, byte count, data...]` layout.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::data::{ByteCollection, DataCollection, LenientRegisterCollection, RegisterCollection};
use crate::error::{MessageError, Result};

pub const READ_HOLDING_REGISTERS: u8 = 3;
pub const READ_INPUT_REGISTERS: u8 = 4;

/// Largest register count a single request or response may carry.
pub const MAX_REGISTER_REQUEST_RESPONSE_SIZE: u16 = 125;

/// A message that can be put on the wire.
pub trait Framable {
    fn function_code(&self) -> u8;

    fn slave_address(&self) -> u8;

    /// Function code followed by the message data.
    fn protocol_data_unit(&self) -> Bytes;

    /// Bytes placed between the origin tag and the checksum.
    fn message_frame(&self) -> Bytes {
        let pdu = self.protocol_data_unit();
        let mut frame = BytesMut::with_capacity(pdu.len() + 1);
        frame.put_u8(self.slave_address());
        frame.put_slice(&pdu);
        frame.freeze()
    }

    /// The request-side validation hook, when the message has one.
    fn as_validatable(&self) -> Option<&dyn Validatable> {
        None
    }
}

/// A request able to check the response it was paired with.
pub trait Validatable {
    fn validate_response(&self, response: &dyn Framable) -> Result<()>;
}

/// A message that can be built from a received frame body.
pub trait FromFrame: Sized {
    /// Frames shorter than this are rejected before `from_frame` runs.
    const MINIMUM_FRAME_SIZE: usize;

    fn from_frame(frame: &[u8]) -> Result<Self>;
}

fn ensure_min(frame: &[u8], min: usize) -> Result<()> {
    if frame.len() < min {
        return Err(MessageError::FrameTooShort {
            min,
            len: frame.len(),
        });
    }
    Ok(())
}

/// A request whose body is an opaque byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadCustomRequest {
    data: ByteCollection,
    slave_address: u8,
    number_of_points: u16,
}

impl ReadCustomRequest {
    pub fn new(data: ByteCollection) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_slave_address(mut self, slave_address: u8) -> Self {
        self.slave_address = slave_address;
        self
    }

    /// Record how many registers the request asks for.
    pub fn with_number_of_points(mut self, number_of_points: u16) -> Result<Self> {
        if number_of_points > MAX_REGISTER_REQUEST_RESPONSE_SIZE {
            return Err(MessageError::TooManyPoints {
                requested: number_of_points,
                max: MAX_REGISTER_REQUEST_RESPONSE_SIZE,
            });
        }
        self.number_of_points = number_of_points;
        Ok(self)
    }

    pub fn data(&self) -> &ByteCollection {
        &self.data
    }

    pub fn number_of_points(&self) -> u16 {
        self.number_of_points
    }

    pub fn byte_count(&self) -> usize {
        self.data.byte_count()
    }
}

impl Framable for ReadCustomRequest {
    fn function_code(&self) -> u8 {
        0
    }

    fn slave_address(&self) -> u8 {
        self.slave_address
    }

    fn protocol_data_unit(&self) -> Bytes {
        self.data.network_bytes()
    }

    fn message_frame(&self) -> Bytes {
        self.data.network_bytes()
    }

    fn as_validatable(&self) -> Option<&dyn Validatable> {
        Some(self)
    }
}

impl Validatable for ReadCustomRequest {
    /// Custom responses have no structure to check against the request.
    fn validate_response(&self, _response: &dyn Framable) -> Result<()> {
        Ok(())
    }
}

impl FromFrame for ReadCustomRequest {
    const MINIMUM_FRAME_SIZE: usize = 7;

    fn from_frame(frame: &[u8]) -> Result<Self> {
        ensure_min(frame, Self::MINIMUM_FRAME_SIZE)?;
        Ok(Self::new(ByteCollection::from(frame)))
    }
}

impl fmt::Display for ReadCustomRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Write {} holding registers starting at slave address {}.",
            self.number_of_points, self.slave_address
        )
    }
}

/// A response whose whole body is read as one register per byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadCustomResponse {
    data: LenientRegisterCollection,
    byte_count: usize,
}

impl ReadCustomResponse {
    pub fn data(&self) -> &LenientRegisterCollection {
        &self.data
    }

    /// Length of the frame body the response was decoded from.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }
}

impl Framable for ReadCustomResponse {
    fn function_code(&self) -> u8 {
        0
    }

    fn slave_address(&self) -> u8 {
        0
    }

    fn protocol_data_unit(&self) -> Bytes {
        self.data.network_bytes()
    }

    fn message_frame(&self) -> Bytes {
        self.data.network_bytes()
    }
}

impl FromFrame for ReadCustomResponse {
    const MINIMUM_FRAME_SIZE: usize = 3;

    fn from_frame(frame: &[u8]) -> Result<Self> {
        ensure_min(frame, Self::MINIMUM_FRAME_SIZE)?;
        Ok(Self {
            data: LenientRegisterCollection::from_network_bytes(frame)?,
            byte_count: frame.len(),
        })
    }
}

impl fmt::Display for ReadCustomResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Read {} input registers.", self.data.len())
    }
}

/// Response to a read holding/input registers request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadHoldingInputRegistersResponse {
    function_code: u8,
    slave_address: u8,
    data: RegisterCollection,
}

impl ReadHoldingInputRegistersResponse {
    pub fn new(function_code: u8, slave_address: u8, data: RegisterCollection) -> Result<Self> {
        let max = usize::from(MAX_REGISTER_REQUEST_RESPONSE_SIZE);
        if data.len() > max {
            return Err(MessageError::TooManyRegisters {
                count: data.len(),
                max,
            });
        }
        Ok(Self {
            function_code,
            slave_address,
            data,
        })
    }

    pub fn data(&self) -> &RegisterCollection {
        &self.data
    }

    /// Number of data bytes, as sent in the byte count field.
    pub fn byte_count(&self) -> u8 {
        // `new` caps the register count and `from_frame` reads it from one byte.
        self.data.byte_count() as u8
    }
}

impl Framable for ReadHoldingInputRegistersResponse {
    fn function_code(&self) -> u8 {
        self.function_code
    }

    fn slave_address(&self) -> u8 {
        self.slave_address
    }

    fn protocol_data_unit(&self) -> Bytes {
        let data = self.data.network_bytes();
        let mut pdu = BytesMut::with_capacity(data.len() + 2);
        pdu.put_u8(self.function_code);
        pdu.put_u8(self.byte_count());
        pdu.put_slice(&data);
        pdu.freeze()
    }
}

impl FromFrame for ReadHoldingInputRegistersResponse {
    const MINIMUM_FRAME_SIZE: usize = 3;

    fn from_frame(frame: &[u8]) -> Result<Self> {
        ensure_min(frame, Self::MINIMUM_FRAME_SIZE)?;
        let byte_count = usize::from(frame[2]);
        let data = frame
            .get(3..3 + byte_count)
            .ok_or(MessageError::NotEnoughBytes)?;

        Ok(Self {
            slave_address: frame[0],
            function_code: frame[1],
            data: RegisterCollection::from_network_bytes(data)?,
        })
    }
}

impl fmt::Display for ReadHoldingInputRegistersResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.function_code == READ_HOLDING_REGISTERS {
            "holding"
        } else {
            "input"
        };
        write!(f, "Read {} {kind} registers.", self.data.len())
    }
}

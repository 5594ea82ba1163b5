//! Message types carried inside tag frames.
//!
//! - [`data`]: register and byte collections with strict or lenient decoding
//! - [`message`]: the framable request/response types and their traits
//! - [`factory`]: building typed responses from received frame bodies

pub mod data;
pub mod error;
pub mod factory;
pub mod message;

pub use data::{
    ByteCollection, DataCollection, Lenient, LenientRegisterCollection, RegisterCollection,
    RegisterDecoding, Registers, Strict,
};
pub use error::{MessageError, Result};
pub use factory::create_response;
pub use message::{
    Framable, FromFrame, ReadCustomRequest, ReadCustomResponse, ReadHoldingInputRegistersResponse,
    Validatable, MAX_REGISTER_REQUEST_RESPONSE_SIZE, READ_HOLDING_REGISTERS, READ_INPUT_REGISTERS,
};

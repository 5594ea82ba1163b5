//! Tag-framed Modbus RTU transport.
//!
//! Frames are `header | origin tag | body | XOR checksum | trailer`, with no
//! length field. Responses end at the trailer, or after a fixed byte count.
//!
//! # Crate Structure
//!
//! - [`stream`]: byte stream abstraction (TCP, Unix domain sockets)
//! - [`frame`]: frame config, codec, XOR checksum and deadline-bounded reader
//! - [`message`]: register/byte collections and request/response messages
//! - [`transport`]: framed request/response exchanges with logging and policy

/// Re-export stream types.
pub mod stream {
    pub use tagrtu_stream::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tagrtu_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use tagrtu_message::*;
}

/// Re-export transport types.
pub mod transport {
    pub use tagrtu_transport::*;
}

//! Request/response transport for tag-framed Modbus links.
//!
//! Ties the byte stream, the frame codec and the message types together:
//! messages are framed and written, responses are read under a deadline,
//! logged raw, stripped of leading garbage and turned into typed messages.

pub mod config;
pub mod error;
pub mod logger;
pub mod policy;
pub mod transport;

pub use config::{
    TransportConfig, DEFAULT_RESPONSE_TIMEOUT, DEFAULT_RETRY_ON_OLD_RESPONSE_THRESHOLD,
};
pub use error::{Result, TransportError};
pub use logger::{FrameLogger, TracingFrameLogger};
pub use policy::{ResponsePolicy, TrailerFramedPolicy};
pub use transport::Transport;

//! Byte stream abstraction for tag-framed RTU links.
//!
//! The transport never opens connections itself. Callers hand it an already
//! connected stream (a TCP socket to a serial server, a Unix socket to a
//! local bridge) and this crate adapts it to the [`StreamResource`] contract
//! the frame reader and writer rely on.

pub mod error;
pub mod traits;

pub use error::{Result, StreamError};
pub use traits::{ByteStream, StreamResource};

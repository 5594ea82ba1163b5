//! Tag framing for Modbus-style RTU links.
//!
//! Replaces RTU's address + CRC-16 framing with a configurable envelope:
//! - A header of any length for stream synchronization
//! - A one-byte origin tag naming the sending side
//! - The message body, followed by a one-byte XOR checksum
//! - A trailer of any length that marks the end of the frame
//!
//! There is no length field. Responses end at the trailer, or after a fixed
//! byte count when the device sends fixed-size answers.

pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod reader;
pub mod supervisor;
pub mod writer;

pub use checksum::{xor, ChecksumPolicy};
pub use codec::{
    build_frame, contains_pattern, decode_frame, encode_frame, find_pattern, locate_header,
    strip_leading_garbage, verify_checksum, FrameParts,
};
pub use config::{FrameConfig, ReadMode, DEFAULT_HEADER, DEFAULT_ORIGIN_TAG, DEFAULT_TRAILER};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use framed::TagFrameCodec;
pub use reader::{FrameReader, READ_CHUNK_SIZE};
pub use supervisor::{run_with_timeout, Reply, TimedFrameReader};
pub use tokio_util::sync::CancellationToken;
pub use writer::FrameWriter;

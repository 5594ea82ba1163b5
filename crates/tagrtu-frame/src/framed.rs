//! `tokio_util::codec` adapter for tag-framed links.
//!
//! Decoding follows the same end-of-frame rules as
//! [`FrameReader`](crate::reader::FrameReader); deadlines are left to the
//! caller (`tokio::time::timeout` around `next()`).

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, find_pattern};
use crate::config::{FrameConfig, ReadMode};
use crate::error::FrameError;

/// Codec yielding raw frames and encoding bodies into frames.
#[derive(Debug, Clone)]
pub struct TagFrameCodec {
    config: FrameConfig,
    scanned: usize,
}

impl TagFrameCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config, scanned: 0 }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for TagFrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.config.read_mode() {
            ReadMode::FixedCount(count) => {
                if src.len() < count {
                    return Ok(None);
                }
                Ok(Some(src.split_to(count).freeze()))
            }
            ReadMode::TrailerScan => {
                let trailer = self.config.trailer();
                let start = self.scanned.saturating_sub(trailer.len().saturating_sub(1));
                match find_pattern(&src[start..], trailer) {
                    Some(pos) => {
                        self.scanned = 0;
                        Ok(Some(src.split_to(start + pos + trailer.len()).freeze()))
                    }
                    None => {
                        self.scanned = src.len();
                        Ok(None)
                    }
                }
            }
        }
    }
}

impl<'a> Encoder<&'a [u8]> for TagFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, body: &'a [u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&self.config, body, dst);
        Ok(())
    }
}

impl Encoder<Bytes> for TagFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&self.config, &body, dst);
        Ok(())
    }
}

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::xor;
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};

/// Encode a frame body into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────┬──────────────┬──────────┬───────────────┐
/// │ Header       │ Origin tag │ Body         │ XOR (1B) │ Trailer       │
/// │ (config, nB) │ (1B)       │ (variable)   │ of body  │ (config, mB)  │
/// └──────────────┴────────────┴──────────────┴──────────┴───────────────┘
/// ```
///
/// There is no length field: the trailer alone marks the end of the frame,
/// so a body containing the trailer sequence will be cut short on receipt.
pub fn encode_frame(config: &FrameConfig, body: &[u8], dst: &mut BytesMut) {
    dst.reserve(config.overhead() + body.len());
    dst.put_slice(config.header());
    dst.put_u8(config.origin_tag());
    dst.put_slice(body);
    dst.put_u8(xor(body));
    dst.put_slice(config.trailer());
}

/// Encode a frame body into a fresh buffer.
pub fn build_frame(config: &FrameConfig, body: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(config.overhead() + body.len());
    encode_frame(config, body, &mut dst);
    dst.freeze()
}

/// Offset of the first occurrence of `pattern` in `data`.
///
/// Plain comparison at every candidate offset. An empty pattern matches at 0.
pub fn find_pattern(data: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.len() > data.len() {
        return None;
    }
    (0..=data.len() - pattern.len()).find(|&i| &data[i..i + pattern.len()] == pattern)
}

/// True when `data` contains `pattern`. An empty pattern is never contained.
pub fn contains_pattern(data: &[u8], pattern: &[u8]) -> bool {
    !pattern.is_empty() && find_pattern(data, pattern).is_some()
}

/// Where the header starts in `frame`.
///
/// `Some(0)` when the frame starts with the header, `Some(n)` when `n` bytes
/// of noise precede it, `None` when the header is absent.
pub fn locate_header(header: &[u8], frame: &[u8]) -> Option<usize> {
    find_pattern(frame, header)
}

/// Drop any bytes received before the header.
///
/// A frame that already starts with the header, or in which no header can be
/// found, is returned unchanged; whatever decodes the frame next decides
/// whether it is usable.
pub fn strip_leading_garbage(header: &[u8], frame: Bytes) -> Bytes {
    match locate_header(header, &frame) {
        Some(index) if index > 0 => {
            tracing::debug!(
                skipped = index,
                discarded = %hex::encode_upper(&frame[..index]),
                "stripped bytes ahead of frame header"
            );
            frame.slice(index..)
        }
        _ => frame,
    }
}

/// The sections of a received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameParts {
    pub header: Bytes,
    pub origin_tag: u8,
    pub body: Bytes,
    pub checksum: u8,
    pub trailer: Bytes,
}

impl FrameParts {
    /// True when the checksum byte equals the XOR of the body.
    pub fn checksum_matches(&self) -> bool {
        xor(&self.body) == self.checksum
    }
}

/// Split a frame that starts with the header into its sections.
///
/// The last `config.trailer().len()` bytes are taken as the trailer. A
/// fixed-count link whose responses carry no trailer must be configured
/// with an empty one.
pub fn decode_frame(config: &FrameConfig, frame: &Bytes) -> Result<FrameParts> {
    let header_len = config.header().len();
    let trailer_len = config.trailer().len();
    let min = header_len + 2 + trailer_len;
    if frame.len() < min {
        return Err(FrameError::FrameTooShort {
            len: frame.len(),
            min,
        });
    }

    let body_end = frame.len() - trailer_len - 1;
    Ok(FrameParts {
        header: frame.slice(..header_len),
        origin_tag: frame[header_len],
        body: frame.slice(header_len + 1..body_end),
        checksum: frame[body_end],
        trailer: frame.slice(body_end + 1..),
    })
}

/// Apply the config's checksum policy to a split frame.
pub fn verify_checksum(config: &FrameConfig, parts: &FrameParts) -> Result<()> {
    config.checksum_policy().check(&parts.body, parts.checksum)
}

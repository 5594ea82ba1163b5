use bytes::Bytes;

use crate::checksum::ChecksumPolicy;
use crate::error::{FrameError, Result};

/// Default frame header.
pub const DEFAULT_HEADER: [u8; 2] = [0x5A, 0x5B];

/// Default origin tag: frames sent by the host side of the link.
pub const DEFAULT_ORIGIN_TAG: u8 = 0xCC;

/// Default trailer: CR LF.
pub const DEFAULT_TRAILER: [u8; 2] = [0x0D, 0x0A];

/// How the end of a response frame is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Read until the trailer pattern appears in the received bytes.
    TrailerScan,
    /// Read exactly this many bytes.
    FixedCount(usize),
}

/// Immutable framing configuration shared by the reader, writer and codec.
///
/// Built once per transport. The `with_*` methods consume the config and
/// return a new one, so a config in use is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    header: Bytes,
    origin_tag: u8,
    trailer: Bytes,
    fixed_read_count: Option<usize>,
    checksum_policy: ChecksumPolicy,
}

impl FrameConfig {
    /// Responses end at the first occurrence of `trailer`.
    pub fn trailer_scan(
        header: impl Into<Bytes>,
        origin_tag: u8,
        trailer: impl Into<Bytes>,
    ) -> Result<Self> {
        let header = header.into();
        let trailer = trailer.into();
        if header.is_empty() {
            return Err(FrameError::InvalidConfig("header must not be empty"));
        }
        if trailer.is_empty() {
            return Err(FrameError::InvalidConfig(
                "trailer must not be empty in trailer-scan mode",
            ));
        }
        Ok(Self {
            header,
            origin_tag,
            trailer,
            fixed_read_count: None,
            checksum_policy: ChecksumPolicy::default(),
        })
    }

    /// Responses are exactly `count` bytes long.
    ///
    /// The default trailer is still written on outgoing frames and expected
    /// at the end of responses. Use [`FrameConfig::with_trailer`] with an
    /// empty trailer for devices that answer without one.
    pub fn fixed_count(header: impl Into<Bytes>, origin_tag: u8, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(FrameError::InvalidConfig("fixed read count must be positive"));
        }
        Ok(Self {
            header: header.into(),
            origin_tag,
            trailer: Bytes::from_static(&DEFAULT_TRAILER),
            fixed_read_count: Some(count),
            checksum_policy: ChecksumPolicy::default(),
        })
    }

    /// A copy with a different origin tag.
    pub fn with_origin_tag(self, origin_tag: u8) -> Self {
        Self { origin_tag, ..self }
    }

    /// A copy with a different trailer.
    pub fn with_trailer(self, trailer: impl Into<Bytes>) -> Result<Self> {
        let trailer = trailer.into();
        if trailer.is_empty() && self.fixed_read_count.is_none() {
            return Err(FrameError::InvalidConfig(
                "trailer must not be empty in trailer-scan mode",
            ));
        }
        Ok(Self { trailer, ..self })
    }

    /// A copy with a different checksum policy.
    pub fn with_checksum_policy(self, checksum_policy: ChecksumPolicy) -> Self {
        Self {
            checksum_policy,
            ..self
        }
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn origin_tag(&self) -> u8 {
        self.origin_tag
    }

    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    pub fn fixed_read_count(&self) -> Option<usize> {
        self.fixed_read_count
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    /// The response end-detection strategy.
    pub fn read_mode(&self) -> ReadMode {
        match self.fixed_read_count {
            Some(count) => ReadMode::FixedCount(count),
            None => ReadMode::TrailerScan,
        }
    }

    /// Bytes a frame adds around its body: header, tag, checksum, trailer.
    pub fn overhead(&self) -> usize {
        self.header.len() + 1 + 1 + self.trailer.len()
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            header: Bytes::from_static(&DEFAULT_HEADER),
            origin_tag: DEFAULT_ORIGIN_TAG,
            trailer: Bytes::from_static(&DEFAULT_TRAILER),
            fixed_read_count: None,
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

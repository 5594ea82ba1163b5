use std::time::Duration;

/// Errors that can occur while building, reading or splitting frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame configuration violates its invariants.
    #[error("invalid frame config: {0}")]
    InvalidConfig(&'static str),

    /// A frame is too short to hold header, tag, checksum and trailer.
    #[error("frame too short ({len} bytes, need at least {min})")]
    FrameTooShort { len: usize, min: usize },

    /// The received checksum does not match the XOR of the body.
    #[error("checksum mismatch: expected {expected:#04x}, received {received:#04x}")]
    ChecksumMismatch { expected: u8, received: u8 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached EOF before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// No complete frame arrived within the response deadline.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The read was cancelled by its supervisor.
    #[error("read cancelled")]
    Cancelled,

    /// The background read worker terminated without reporting a result.
    #[error("read worker lost: {0}")]
    WorkerLost(String),
}

impl FrameError {
    /// True when the error is the supervisor's deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

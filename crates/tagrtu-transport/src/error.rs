/// Errors that can occur during a transport exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Stream-level error.
    #[error("stream error: {0}")]
    Stream(#[from] tagrtu_stream::StreamError),

    /// Frame-level error, including read timeouts.
    #[error("frame error: {0}")]
    Frame(#[from] tagrtu_frame::FrameError),

    /// A response could not be built or failed request validation.
    #[error("message error: {0}")]
    Message(#[from] tagrtu_message::MessageError),
}

impl TransportError {
    /// True when no response arrived within the response deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Frame(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

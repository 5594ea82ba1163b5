/// Errors raised while building or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The frame is shorter than the message type's minimum size.
    #[error("Message frame must contain at least {min} bytes of data.")]
    FrameTooShort { min: usize, len: usize },

    /// Strict register decoding needs an even number of bytes.
    #[error("register data must have an even byte count, got {0}")]
    OddByteCount(usize),

    /// The frame's byte count field claims more data than the frame holds.
    #[error("Message frame does not contain enough bytes.")]
    NotEnoughBytes,

    #[error("Maximum amount of data {max} registers (requested {requested}).")]
    TooManyPoints { requested: u16, max: u16 },

    #[error("a response carries at most {max} registers, got {count}")]
    TooManyRegisters { count: usize, max: usize },

    /// A request rejected the response it was paired with.
    #[error("response validation failed: {0}")]
    Validation(String),
}

/// Result type for message operations.
pub type Result<T> = std::result::Result<T, MessageError>;

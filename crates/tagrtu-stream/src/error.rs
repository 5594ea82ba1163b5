/// Errors that can occur on the underlying byte stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// An I/O error occurred on the stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream handle could not be duplicated into read and write halves.
    #[error("failed to clone stream handle: {0}")]
    Clone(std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;

use std::time::Duration;

use tagrtu_frame::FrameConfig;

/// Response deadline used when the stream has no write timeout.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Responses a single `unicast` may discard before accepting one.
pub const DEFAULT_RETRY_ON_OLD_RESPONSE_THRESHOLD: usize = 3;

/// Transport-level configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Wire framing for outgoing and incoming frames.
    pub frame: FrameConfig,
    /// How long a read may wait for a complete frame.
    pub response_timeout: Duration,
    /// Upper bound on responses the retry policy may discard per exchange.
    pub retry_on_old_response_threshold: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            retry_on_old_response_threshold: DEFAULT_RETRY_ON_OLD_RESPONSE_THRESHOLD,
        }
    }
}

impl TransportConfig {
    pub fn new(frame: FrameConfig) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

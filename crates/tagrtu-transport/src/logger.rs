use tracing::debug;

/// Receives every raw frame the transport sends or receives.
///
/// Received frames are passed on before any stripping or validation, so a
/// malformed response is still logged.
pub trait FrameLogger: Send {
    fn log_frame_tx(&self, frame: &[u8]);
    fn log_frame_rx(&self, frame: &[u8]);
}

/// Logs frames as upper-case hex `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFrameLogger;

impl FrameLogger for TracingFrameLogger {
    fn log_frame_tx(&self, frame: &[u8]) {
        debug!(len = frame.len(), frame = %hex::encode_upper(frame), "TX");
    }

    fn log_frame_rx(&self, frame: &[u8]) {
        debug!(len = frame.len(), frame = %hex::encode_upper(frame), "RX");
    }
}

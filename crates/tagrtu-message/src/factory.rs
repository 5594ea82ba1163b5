use tracing::debug;

use crate::error::{MessageError, Result};
use crate::message::FromFrame;

/// Build a response of type `T` from a received frame body.
///
/// Bodies shorter than `T::MINIMUM_FRAME_SIZE` are rejected before the
/// message sees them.
pub fn create_response<T: FromFrame>(frame: &[u8]) -> Result<T> {
    if frame.len() < T::MINIMUM_FRAME_SIZE {
        debug!(
            len = frame.len(),
            min = T::MINIMUM_FRAME_SIZE,
            "response body too short"
        );
        return Err(MessageError::FrameTooShort {
            min: T::MINIMUM_FRAME_SIZE,
            len: frame.len(),
        });
    }
    T::from_frame(frame)
}

use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::codec::find_pattern;
use crate::config::{FrameConfig, ReadMode};
use crate::error::{FrameError, Result};

/// Size of the initial read window and of each growth step.
pub const READ_CHUNK_SIZE: usize = 64;

/// Reads complete frames from any `Read` stream.
///
/// Handles short reads internally; callers always get whole frames. Bytes
/// that arrive after a frame's trailer stay buffered for the next call.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    /// Upper bound on `buf.len()` before the window grows by a chunk.
    window: usize,
    /// Offset up to which `buf` is known not to contain the trailer.
    scanned: usize,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            window: READ_CHUNK_SIZE,
            scanned: 0,
        }
    }

    /// Read the next response frame using the config's read mode (blocking).
    pub fn read_response(
        &mut self,
        config: &FrameConfig,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        match config.read_mode() {
            ReadMode::TrailerScan => self.read_until_trailer(config.trailer(), cancel),
            ReadMode::FixedCount(count) => self.read_exact_count(count, cancel),
        }
    }

    /// Read until `trailer` has been received; return everything up to and
    /// including it.
    ///
    /// The buffer has no upper bound: a peer that never sends the trailer
    /// makes this grow until the caller's timeout fires.
    pub fn read_until_trailer(
        &mut self,
        trailer: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        if trailer.is_empty() {
            return Err(FrameError::InvalidConfig(
                "trailer must not be empty in trailer-scan mode",
            ));
        }

        loop {
            if let Some(end) = self.scan_for(trailer) {
                return Ok(self.take(end));
            }
            self.fill(cancel)?;
        }
    }

    /// Read exactly `count` bytes.
    pub fn read_exact_count(&mut self, count: usize, cancel: &CancellationToken) -> Result<Bytes> {
        while self.buf.len() < count {
            self.fill(cancel)?;
        }
        Ok(self.take(count))
    }

    /// Put a frame back in front of any buffered bytes.
    pub fn unread(&mut self, frame: Bytes) {
        let mut restored = BytesMut::with_capacity(frame.len() + self.buf.len());
        restored.extend_from_slice(&frame);
        restored.extend_from_slice(&self.buf);
        self.buf = restored;
        self.scanned = 0;
        self.window = READ_CHUNK_SIZE.max(self.buf.len());
    }

    /// Number of bytes received but not yet returned as part of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// End offset of the first trailer match in the buffer.
    fn scan_for(&mut self, trailer: &[u8]) -> Option<usize> {
        // A match may straddle the previously scanned region.
        let start = self.scanned.saturating_sub(trailer.len() - 1);
        match find_pattern(&self.buf[start..], trailer) {
            Some(pos) => Some(start + pos + trailer.len()),
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Split off the first `len` bytes as a frame and reset the window.
    fn take(&mut self, len: usize) -> Bytes {
        let frame = self.buf.split_to(len).freeze();
        self.scanned = 0;
        self.window = READ_CHUNK_SIZE.max(self.buf.len());
        trace!(len, remaining = self.buf.len(), "frame complete");
        frame
    }

    /// Perform one read into the free part of the window.
    fn fill(&mut self, cancel: &CancellationToken) -> Result<()> {
        if self.buf.len() == self.window {
            self.window += READ_CHUNK_SIZE;
            trace!(window = self.window, "read window grown");
        }
        let want = self.window - self.buf.len();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if cancel.is_cancelled() {
                return Err(FrameError::Cancelled);
            }
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            trace!(read, buffered = self.buf.len() + read, "partial read");
            self.buf.extend_from_slice(&chunk[..read]);
            return Ok(());
        }
    }
}

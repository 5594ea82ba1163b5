use std::io::{self, ErrorKind, Write};
use std::sync::Arc;

use bytes::BytesMut;
use tracing::trace;

use crate::codec::encode_frame;
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Frames message bodies and writes them to a `Write` stream (blocking).
///
/// Short writes are continued until the whole frame is out; the stream is
/// flushed after every frame.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: Arc<FrameConfig>,
}

fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

impl<T: Write> FrameWriter<T> {
    /// Writer using the default envelope (`5A 5B`, `CC`, `0D 0A`).
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, Arc::new(FrameConfig::default()))
    }

    pub fn with_config(inner: T, config: Arc<FrameConfig>) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Wrap `body` in header, tag, checksum and trailer, then send it.
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(&self.config, body, &mut self.buf);
        self.write_frame()
    }

    /// Send a frame that has already been built.
    pub fn send_raw(&mut self, frame: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(frame);
        self.write_frame()
    }

    fn write_frame(&mut self) -> Result<()> {
        let mut remaining = &self.buf[..];
        while !remaining.is_empty() {
            match self.inner.write(remaining) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => remaining = &remaining[n..],
                Err(err) if is_transient(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        trace!(len = self.buf.len(), "frame written");
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if is_transient(&err) => continue,
                other => return other.map_err(FrameError::from),
            }
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;
    use crate::codec::{decode_frame, strip_leading_garbage};
    use crate::reader::FrameReader;
    use crate::CancellationToken;

    /// What a [`HiccupSink`] does on its next `write` or `flush` call.
    enum Step {
        Fail(ErrorKind),
        Accept(usize),
        Closed,
    }

    /// Follows a script of write results, then accepts everything.
    #[derive(Default)]
    struct HiccupSink {
        writes: VecDeque<Step>,
        flush_failures: VecDeque<ErrorKind>,
        written: Vec<u8>,
        flushes: usize,
    }

    impl Write for HiccupSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = match self.writes.pop_front() {
                Some(Step::Fail(kind)) => return Err(kind.into()),
                Some(Step::Closed) => return Ok(0),
                Some(Step::Accept(n)) => n.min(buf.len()),
                None => buf.len(),
            };
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            if let Some(kind) = self.flush_failures.pop_front() {
                return Err(kind.into());
            }
            self.flushes += 1;
            Ok(())
        }
    }

    const REFERENCE: [u8; 8] = [0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A];

    #[test]
    fn writes_reference_frame() {
        let mut writer = FrameWriter::new(HiccupSink::default());
        writer.send(&[0x01, 0x02]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.written, REFERENCE);
        assert_eq!(sink.flushes, 1);
    }

    #[test]
    fn uses_configured_envelope() {
        let cfg = FrameConfig::trailer_scan(vec![0xAAu8], 0x01, vec![0xFFu8, 0xFE]).unwrap();
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), Arc::new(cfg));
        writer.send(&[0x10, 0x20]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0xAA, 0x01, 0x10, 0x20, 0x30, 0xFF, 0xFE]);
    }

    #[test]
    fn short_writes_are_continued() {
        let sink = HiccupSink {
            writes: VecDeque::from([Step::Accept(1), Step::Accept(3), Step::Accept(2)]),
            ..HiccupSink::default()
        };
        let mut writer = FrameWriter::new(sink);
        writer.send(&[0x01, 0x02]).unwrap();

        assert_eq!(writer.get_ref().written, REFERENCE);
    }

    #[test]
    fn transient_errors_are_retried() {
        let sink = HiccupSink {
            writes: VecDeque::from([
                Step::Fail(ErrorKind::Interrupted),
                Step::Accept(4),
                Step::Fail(ErrorKind::WouldBlock),
            ]),
            flush_failures: VecDeque::from([ErrorKind::Interrupted]),
            ..HiccupSink::default()
        };
        let mut writer = FrameWriter::new(sink);
        writer.send(&[0x01, 0x02]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.written, REFERENCE);
        assert_eq!(sink.flushes, 1);
    }

    #[test]
    fn zero_length_write_means_closed() {
        let sink = HiccupSink {
            writes: VecDeque::from([Step::Accept(2), Step::Closed]),
            ..HiccupSink::default()
        };
        let mut writer = FrameWriter::new(sink);

        let err = writer.send(&[0x01]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn hard_errors_propagate() {
        let sink = HiccupSink {
            writes: VecDeque::from([Step::Fail(ErrorKind::BrokenPipe)]),
            ..HiccupSink::default()
        };
        let mut writer = FrameWriter::new(sink);

        let err = writer.send(&[0x01]).unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn send_raw_skips_framing() {
        let mut writer = FrameWriter::new(HiccupSink::default());
        writer.send_raw(&[0x01, 0x02, 0x03]).unwrap();

        assert_eq!(writer.get_mut().written, vec![0x01, 0x02, 0x03]);
        assert_eq!(writer.config().origin_tag(), 0xCC);
    }

    #[test]
    fn written_frames_read_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(&[0x01]).unwrap();
        writer.send(&[0x02, 0x03]).unwrap();

        let cfg = FrameConfig::default();
        let mut reader = FrameReader::new(Cursor::new(writer.into_inner().into_inner()));
        let cancel = CancellationToken::new();

        for expected in [&[0x01u8][..], &[0x02, 0x03][..]] {
            let frame = reader.read_response(&cfg, &cancel).unwrap();
            let parts = decode_frame(&cfg, &strip_leading_garbage(cfg.header(), frame)).unwrap();
            assert_eq!(parts.body.as_ref(), expected);
        }
    }
}

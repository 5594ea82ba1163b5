use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tagrtu_frame::{
    build_frame, decode_frame, strip_leading_garbage, verify_checksum, ChecksumPolicy,
    FrameConfig, FrameWriter, TimedFrameReader,
};
use tagrtu_message::{create_response, Framable, FromFrame};
use tagrtu_stream::StreamResource;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::Result;
use crate::logger::{FrameLogger, TracingFrameLogger};
use crate::policy::{ResponsePolicy, TrailerFramedPolicy};

/// One end of a tag-framed request/response link.
///
/// Reads and writes go through separate handles, so a write never waits
/// behind a read that is still blocked after its deadline. Only one
/// exchange may be in flight at a time.
pub struct Transport<R, W> {
    reader: TimedFrameReader<R>,
    writer: FrameWriter<W>,
    config: Arc<FrameConfig>,
    retry_threshold: usize,
    logger: Box<dyn FrameLogger>,
    policy: Box<dyn ResponsePolicy>,
}

impl<S> Transport<S, S>
where
    S: StreamResource + 'static,
{
    /// Build a transport over a connected stream.
    ///
    /// The stream is cloned so reads and writes use separate handles. A
    /// write timeout set on the stream replaces `config.response_timeout`.
    pub fn from_stream(stream: S, config: TransportConfig) -> Result<Self> {
        let reader = stream.try_clone_stream()?;
        let timeout = stream.write_timeout().unwrap_or(config.response_timeout);
        debug!(?timeout, "transport created from stream");
        Ok(Self::new(reader, stream, config.with_response_timeout(timeout)))
    }
}

impl<R, W> Transport<R, W>
where
    R: Read + Send + 'static,
    W: Write,
{
    pub fn new(reader: R, writer: W, config: TransportConfig) -> Self {
        let frame_config = Arc::new(config.frame);
        Self {
            reader: TimedFrameReader::new(
                reader,
                Arc::clone(&frame_config),
                config.response_timeout,
            ),
            writer: FrameWriter::with_config(writer, Arc::clone(&frame_config)),
            config: frame_config,
            retry_threshold: config.retry_on_old_response_threshold,
            logger: Box::new(TracingFrameLogger),
            policy: Box::new(TrailerFramedPolicy),
        }
    }

    /// Replace the frame logger.
    pub fn with_logger(mut self, logger: impl FrameLogger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// Replace the response policy.
    pub fn with_policy(mut self, policy: impl ResponsePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Set the response deadline for subsequent reads.
    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.reader = self.reader.with_timeout(timeout);
    }

    pub fn response_timeout(&self) -> Duration {
        self.reader.timeout()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// The complete wire frame for `message`.
    pub fn build_message_frame(&self, message: &dyn Framable) -> Bytes {
        build_frame(&self.config, &message.message_frame())
    }

    /// Frame and send `message`.
    pub fn write(&mut self, message: &dyn Framable) -> Result<()> {
        let frame = self.build_message_frame(message);
        self.logger.log_frame_tx(&frame);
        self.writer.send_raw(&frame)?;
        Ok(())
    }

    /// Read one response and build a `T` from it.
    ///
    /// `T` is built from the whole frame, starting at the header when one
    /// is found.
    pub fn read_response<T: FromFrame>(&mut self) -> Result<T> {
        let frame = self.read_stripped()?;
        self.check_frame(&frame)?;
        Ok(create_response::<T>(&frame)?)
    }

    /// Read one incoming request frame, starting at the header when one is
    /// found.
    pub fn read_request(&mut self) -> Result<Bytes> {
        self.read_stripped()
    }

    /// Send `request` and return its validated response.
    pub fn unicast<T>(&mut self, request: &dyn Framable) -> Result<T>
    where
        T: FromFrame + Framable,
    {
        self.write(request)?;

        let mut discarded = 0usize;
        loop {
            let response = self.read_response::<T>()?;
            if discarded < self.retry_threshold && self.should_retry_response(request, &response)
            {
                discarded += 1;
                debug!(discarded, "policy rejected response; reading another");
                continue;
            }
            self.validate_response(request, &response)?;
            return Ok(response);
        }
    }

    /// Nothing to drain: reads already stop at the end of a frame.
    pub fn ignore_response(&mut self) {}

    pub fn should_retry_response(&self, request: &dyn Framable, response: &dyn Framable) -> bool {
        self.policy.should_retry(request, response)
    }

    pub fn validate_response(
        &self,
        request: &dyn Framable,
        response: &dyn Framable,
    ) -> Result<()> {
        self.policy.validate(request, response)?;
        Ok(())
    }

    fn read_stripped(&mut self) -> Result<Bytes> {
        let frame = self.reader.read_response()?;
        self.logger.log_frame_rx(&frame);
        Ok(strip_leading_garbage(self.config.header(), frame))
    }

    fn check_frame(&self, frame: &Bytes) -> Result<()> {
        if self.config.checksum_policy() == ChecksumPolicy::Ignore {
            return Ok(());
        }
        let parts = decode_frame(&self.config, frame)?;
        verify_checksum(&self.config, &parts)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::Mutex;
    use std::thread;

    use tagrtu_frame::{FrameError, ReadMode};
    use tagrtu_message::{
        ByteCollection, MessageError, ReadCustomRequest, ReadCustomResponse,
        ReadHoldingInputRegistersResponse, RegisterCollection, READ_HOLDING_REGISTERS,
    };
    use tagrtu_stream::ByteStream;

    use super::*;
    use crate::error::TransportError;

    #[derive(Clone, Default)]
    struct RecordingLogger {
        tx: Arc<Mutex<Vec<Vec<u8>>>>,
        rx: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl FrameLogger for RecordingLogger {
        fn log_frame_tx(&self, frame: &[u8]) {
            self.tx.lock().unwrap().push(frame.to_vec());
        }

        fn log_frame_rx(&self, frame: &[u8]) {
            self.rx.lock().unwrap().push(frame.to_vec());
        }
    }

    /// Retries every response, to exercise the discard bound.
    struct AlwaysRetry;

    impl ResponsePolicy for AlwaysRetry {
        fn should_retry(&self, _: &dyn Framable, _: &dyn Framable) -> bool {
            true
        }

        fn validate(&self, _: &dyn Framable, _: &dyn Framable) -> tagrtu_message::Result<()> {
            Ok(())
        }
    }

    struct RejectAll;

    impl ResponsePolicy for RejectAll {
        fn should_retry(&self, _: &dyn Framable, _: &dyn Framable) -> bool {
            false
        }

        fn validate(&self, _: &dyn Framable, _: &dyn Framable) -> tagrtu_message::Result<()> {
            Err(MessageError::Validation("rejected".to_string()))
        }
    }

    fn transport_pair(
        config: TransportConfig,
    ) -> (Transport<ByteStream, ByteStream>, UnixStream) {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let transport = Transport::from_stream(ByteStream::from(ours), config).unwrap();
        (transport, theirs)
    }

    fn short_timeout() -> TransportConfig {
        TransportConfig::default().with_response_timeout(Duration::from_secs(2))
    }

    fn request() -> ReadCustomRequest {
        ReadCustomRequest::new(ByteCollection::new(vec![0x01u8, 0x02]))
    }

    #[test]
    fn build_message_frame_wraps_message_frame() {
        let (transport, _peer) = transport_pair(short_timeout());
        let frame = transport.build_message_frame(&request());
        assert_eq!(
            frame.as_ref(),
            &[0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A]
        );
    }

    #[test]
    fn write_logs_and_sends_frame() {
        let logger = RecordingLogger::default();
        let (transport, mut peer) = transport_pair(short_timeout());
        let mut transport = transport.with_logger(logger.clone());

        transport.write(&request()).unwrap();

        let mut wire = [0u8; 8];
        std::io::Read::read_exact(&mut peer, &mut wire).unwrap();
        assert_eq!(wire, [0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A]);
        assert_eq!(logger.tx.lock().unwrap().as_slice(), &[wire.to_vec()]);
    }

    #[test]
    fn read_response_strips_garbage_and_logs_raw_frame() {
        let logger = RecordingLogger::default();
        let (transport, mut peer) = transport_pair(short_timeout());
        let mut transport = transport.with_logger(logger.clone());

        let raw = [0xFF, 0x00, 0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A];
        peer.write_all(&raw).unwrap();

        let response: ReadCustomResponse = transport.read_response().unwrap();
        assert_eq!(
            response.data().as_slice(),
            &[0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A]
        );
        assert_eq!(logger.rx.lock().unwrap().as_slice(), &[raw.to_vec()]);
    }

    #[test]
    fn short_response_is_logged_before_rejection() {
        let logger = RecordingLogger::default();
        let config = TransportConfig::new(
            FrameConfig::fixed_count(vec![0x5Au8, 0x5B], 0xCC, 2).unwrap(),
        )
        .with_response_timeout(Duration::from_secs(2));
        let (transport, mut peer) = transport_pair(config);
        let mut transport = transport.with_logger(logger.clone());
        assert_eq!(transport.config().read_mode(), ReadMode::FixedCount(2));

        peer.write_all(&[0x5A, 0x5B]).unwrap();

        let err = transport.read_response::<ReadCustomResponse>().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Message(MessageError::FrameTooShort { min: 3, len: 2 })
        ));
        assert_eq!(logger.rx.lock().unwrap().len(), 1);
    }

    #[test]
    fn read_times_out_without_trailer() {
        let config = TransportConfig::default().with_response_timeout(Duration::from_millis(50));
        let (mut transport, mut peer) = transport_pair(config);
        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x01]).unwrap();

        let err = transport.read_response::<ReadCustomResponse>().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(transport.response_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn stream_write_timeout_sets_response_deadline() {
        let (ours, _peer) = UnixStream::pair().unwrap();
        ours.set_write_timeout(Some(Duration::from_secs(3))).unwrap();

        let transport =
            Transport::from_stream(ByteStream::from(ours), TransportConfig::default()).unwrap();
        assert_eq!(transport.response_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn response_timeout_falls_back_to_config() {
        let (transport, _peer) = transport_pair(short_timeout());
        assert_eq!(transport.response_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn checksum_verified_when_enabled() {
        let frame_config = FrameConfig::default().with_checksum_policy(ChecksumPolicy::Verify);
        let config = TransportConfig::new(frame_config).with_response_timeout(Duration::from_secs(2));
        let (mut transport, mut peer) = transport_pair(config);

        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x01, 0x02, 0xEE, 0x0D, 0x0A])
            .unwrap();
        let err = transport.read_response::<ReadCustomResponse>().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Frame(FrameError::ChecksumMismatch {
                expected: 0x03,
                received: 0xEE
            })
        ));

        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x01, 0x02, 0x03, 0x0D, 0x0A])
            .unwrap();
        transport.read_response::<ReadCustomResponse>().unwrap();
    }

    #[test]
    fn verified_trailerless_fixed_count_response() {
        let frame_config = FrameConfig::fixed_count(vec![0x5Au8, 0x5B], 0xCC, 6)
            .and_then(|cfg| cfg.with_trailer(Vec::<u8>::new()))
            .unwrap()
            .with_checksum_policy(ChecksumPolicy::Verify);
        let config = TransportConfig::new(frame_config).with_response_timeout(Duration::from_secs(2));
        let (mut transport, mut peer) = transport_pair(config);

        // Body 07 0D, checksum 0A: the last two bytes look like the default trailer.
        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x07, 0x0D, 0x0A]).unwrap();
        let response = transport.read_response::<ReadCustomResponse>().unwrap();
        assert_eq!(response.byte_count(), 6);
    }

    #[test]
    fn bad_checksum_accepted_by_default() {
        let (mut transport, mut peer) = transport_pair(short_timeout());
        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x01, 0x02, 0xEE, 0x0D, 0x0A])
            .unwrap();
        transport.read_response::<ReadCustomResponse>().unwrap();
    }

    #[test]
    fn read_request_returns_stripped_frame() {
        let (mut transport, mut peer) = transport_pair(short_timeout());
        peer.write_all(&[0x11, 0x5A, 0x5B, 0xCC, 0x07, 0x07, 0x0D, 0x0A])
            .unwrap();

        let frame = transport.read_request().unwrap();
        assert_eq!(frame.as_ref(), &[0x5A, 0x5B, 0xCC, 0x07, 0x07, 0x0D, 0x0A]);
    }

    #[test]
    fn frame_without_header_passes_through() {
        let (mut transport, mut peer) = transport_pair(short_timeout());
        peer.write_all(&[0x01, 0x02, 0x03, 0x0D, 0x0A]).unwrap();

        let frame = transport.read_request().unwrap();
        assert_eq!(frame.as_ref(), &[0x01, 0x02, 0x03, 0x0D, 0x0A]);
    }

    #[test]
    fn unicast_round_trip() {
        let (mut transport, mut peer) = transport_pair(short_timeout());

        let device = thread::spawn(move || {
            let mut request = [0u8; 8];
            std::io::Read::read_exact(&mut peer, &mut request).unwrap();
            assert_eq!(&request[3..5], &[0x01, 0x02]);
            peer.write_all(&[0x5A, 0x5B, 0xCC, 0x00, 0x01, 0x01, 0x0D, 0x0A])
                .unwrap();
        });

        let response: ReadCustomResponse = transport.unicast(&request()).unwrap();
        assert_eq!(response.byte_count(), 8);
        device.join().unwrap();
    }

    #[test]
    fn unicast_validation_failure_surfaces_as_message_error() {
        let (transport, mut peer) = transport_pair(short_timeout());
        let mut transport = transport.with_policy(RejectAll);
        peer.write_all(&[0x5A, 0x5B, 0xCC, 0x00, 0x01, 0x01, 0x0D, 0x0A])
            .unwrap();

        let err = transport
            .unicast::<ReadCustomResponse>(&request())
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Message(MessageError::Validation(_))
        ));
    }

    #[test]
    fn unicast_discards_at_most_threshold_responses() {
        let (transport, mut peer) = transport_pair(short_timeout());
        let mut transport = transport.with_policy(AlwaysRetry);

        for last in 1..=4u8 {
            peer.write_all(&[0x5A, 0x5B, 0xCC, 0x00, last, last, 0x0D, 0x0A])
                .unwrap();
        }

        let response: ReadCustomResponse = transport.unicast(&request()).unwrap();
        assert_eq!(response.data().as_slice()[4], 4);
    }

    #[test]
    fn holding_response_over_fixed_count_link() {
        let config = TransportConfig::new(FrameConfig::fixed_count(Vec::<u8>::new(), 0xCC, 7).unwrap())
            .with_response_timeout(Duration::from_secs(2));
        let (mut transport, mut peer) = transport_pair(config);

        let expected = ReadHoldingInputRegistersResponse::new(
            READ_HOLDING_REGISTERS,
            1,
            RegisterCollection::new(vec![1, 2]),
        )
        .unwrap();
        peer.write_all(&expected.message_frame()).unwrap();

        let response: ReadHoldingInputRegistersResponse = transport.read_response().unwrap();
        assert_eq!(response, expected);
        assert_eq!(response.to_string(), "Read 2 holding registers.");
    }

    #[test]
    fn ignore_response_is_noop() {
        let (mut transport, _peer) = transport_pair(short_timeout());
        transport.ignore_response();
        assert!(!transport.should_retry_response(&request(), &request()));
        transport.validate_response(&request(), &request()).unwrap();
    }
}

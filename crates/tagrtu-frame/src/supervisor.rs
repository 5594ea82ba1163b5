//! Deadline-bounded blocking reads.
//!
//! A blocking read runs on a background thread while the caller waits on a
//! channel with a deadline. When the deadline passes, the caller gets
//! [`FrameError::Timeout`] and the worker's [`CancellationToken`] is
//! cancelled. Cancellation is only observed between reads: a `read` call
//! already blocked inside the OS keeps running until data arrives or the
//! stream errors, and the worker keeps its lock on the reader until then.
//! Workers started while that lock is held give up once cancelled, so at
//! most one abandoned read is ever left running.

use std::io::Read;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::reader::FrameReader;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// The worker's side of a supervised operation.
pub struct Reply<T> {
    tx: mpsc::SyncSender<Result<T>>,
}

impl<T> Reply<T> {
    /// Hand the result to the waiting caller.
    ///
    /// The channel has no buffer, so the result is either taken by the
    /// caller or given back here when the caller has already timed out.
    pub fn send(self, result: Result<T>) -> Option<Result<T>> {
        self.tx.send(result).err().map(|mpsc::SendError(result)| result)
    }
}

/// Run `op` on a worker thread and wait at most `timeout` for its reply.
pub fn run_with_timeout<T, F>(op: F, timeout: Duration) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken, Reply<T>) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let (tx, rx) = mpsc::sync_channel(0);

    thread::Builder::new()
        .name("tagrtu-read".to_string())
        .spawn(move || op(worker_cancel, Reply { tx }))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.cancel();
            warn!(?timeout, "read deadline elapsed; worker cancelled");
            Err(FrameError::Timeout(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(FrameError::WorkerLost(
            "read worker exited without a result".to_string(),
        )),
    }
}

/// A [`FrameReader`] whose reads are bounded by a deadline.
///
/// The reader sits behind a mutex so a worker abandoned by a timeout still
/// owns it until its blocked read returns; the next read waits for it. A frame
/// completed after its caller gave up is pushed back and returned by the
/// next read. Reads must not be issued concurrently.
pub struct TimedFrameReader<R> {
    inner: Arc<Mutex<FrameReader<R>>>,
    config: Arc<FrameConfig>,
    timeout: Duration,
}

impl<R: Read + Send + 'static> TimedFrameReader<R> {
    pub fn new(inner: R, config: Arc<FrameConfig>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameReader::new(inner))),
            config,
            timeout,
        }
    }

    /// Read one response frame, or fail with [`FrameError::Timeout`].
    pub fn read_response(&self) -> Result<Bytes> {
        let reader = Arc::clone(&self.inner);
        let config = Arc::clone(&self.config);

        let frame = run_with_timeout(
            move |cancel, reply| {
                let mut reader = match lock_unless_cancelled(&reader, &cancel) {
                    Ok(Some(reader)) => reader,
                    Ok(None) => return,
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        return;
                    }
                };
                let result = reader.read_response(&config, &cancel);
                if let Some(Ok(frame)) = reply.send(result) {
                    debug!(len = frame.len(), "caller gone; frame kept for next read");
                    reader.unread(frame);
                }
            },
            self.timeout,
        )?;
        debug!(len = frame.len(), "frame received");
        Ok(frame)
    }

    /// A copy of this reader with a different deadline, sharing the stream.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: Arc::clone(&self.config),
            timeout,
        }
    }

    /// The response deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The framing configuration reads follow.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Wait for the reader lock, giving up with `None` once `cancel` fires.
fn lock_unless_cancelled<'a, R>(
    reader: &'a Mutex<FrameReader<R>>,
    cancel: &CancellationToken,
) -> Result<Option<MutexGuard<'a, FrameReader<R>>>> {
    loop {
        match reader.try_lock() {
            Ok(guard) => return Ok(Some(guard)),
            Err(TryLockError::WouldBlock) => {
                if cancel.is_cancelled() {
                    debug!("cancelled while an earlier read held the stream");
                    return Ok(None);
                }
                thread::sleep(LOCK_POLL_INTERVAL);
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(FrameError::WorkerLost(
                    "frame reader lock poisoned".to_string(),
                ))
            }
        }
    }
}

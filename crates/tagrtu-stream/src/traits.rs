use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, StreamError};

/// A byte stream a tag-framed transport can own.
///
/// Reads are blocking and may return fewer bytes than requested. The
/// stream's write timeout doubles as the transport's response deadline.
pub trait StreamResource: Read + Write + Send {
    /// Write timeout configured on the stream, if any.
    fn write_timeout(&self) -> Option<Duration>;

    /// Duplicate the handle so reads and writes can proceed independently.
    fn try_clone_stream(&self) -> Result<Self>
    where
        Self: Sized;
}

/// A connected byte stream implementing Read + Write.
///
/// Wraps the std socket types serial servers and local bridges are usually
/// reached through. Connection setup stays with the caller.
pub struct ByteStream {
    inner: ByteStreamInner,
}

enum ByteStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ByteStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ByteStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            ByteStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl From<TcpStream> for ByteStream {
    fn from(stream: TcpStream) -> Self {
        Self {
            inner: ByteStreamInner::Tcp(stream),
        }
    }
}

#[cfg(unix)]
impl From<std::os::unix::net::UnixStream> for ByteStream {
    fn from(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: ByteStreamInner::Unix(stream),
        }
    }
}

impl ByteStream {
    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            ByteStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            ByteStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            ByteStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            ByteStreamInner::Unix(_) => "unix-domain-socket",
        }
    }
}

impl StreamResource for ByteStream {
    fn write_timeout(&self) -> Option<Duration> {
        let timeout = match &self.inner {
            ByteStreamInner::Tcp(stream) => stream.write_timeout(),
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => stream.write_timeout(),
        };
        // A socket that cannot report its timeout is treated as having none.
        timeout.unwrap_or(None)
    }

    fn try_clone_stream(&self) -> Result<Self> {
        let inner = match &self.inner {
            ByteStreamInner::Tcp(stream) => {
                ByteStreamInner::Tcp(stream.try_clone().map_err(StreamError::Clone)?)
            }
            #[cfg(unix)]
            ByteStreamInner::Unix(stream) => {
                ByteStreamInner::Unix(stream.try_clone().map_err(StreamError::Clone)?)
            }
        };
        debug!(transport = self.transport_name(), "cloned stream handle");
        Ok(Self { inner })
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

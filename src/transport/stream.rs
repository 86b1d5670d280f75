//! Line-terminated transport over a blocking byte stream.
//!
//! Provides clean async command I/O for instruments reached through RS-232 or
//! a raw TCP socket. The stream sits behind `Arc<Mutex>` and every exchange
//! runs on Tokio's blocking task executor, so synchronous device reads never
//! stall the runtime.

use super::{MessageTransport, Termination};
use crate::error::TransportError;
use async_trait::async_trait;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Default reply timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-read timeout of the underlying port, so the reply deadline is
/// checked regularly.
#[cfg(feature = "instrument_serial")]
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Transport over an RS-232 port.
#[cfg(feature = "instrument_serial")]
pub type SerialTransport = StreamTransport<Box<dyn serialport::SerialPort>>;

/// Transport over a raw TCP socket.
pub type TcpTransport = StreamTransport<TcpStream>;

/// Transport over a blocking `Read + Write` stream.
pub struct StreamTransport<S> {
    stream: Arc<Mutex<S>>,
    termination: Termination,
    timeout: Duration,
}

impl<S> StreamTransport<S>
where
    S: Read + Write + Send + 'static,
{
    /// Wrap an already open stream.
    pub fn new(stream: S, termination: Termination, timeout: Duration) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
            termination,
            timeout,
        }
    }

    /// Terminators in use.
    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    /// Reply timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(
        &self,
        command: &str,
        expect_reply: bool,
    ) -> Result<Option<String>, TransportError> {
        let stream = Arc::clone(&self.stream);
        let frame = self.termination.frame(command);
        let terminator = self.termination.read.clone().into_bytes();
        let timeout = self.timeout;

        debug!("-> {}", command);
        let reply = tokio::task::spawn_blocking(move || -> Result<Option<String>, TransportError> {
            let mut stream = stream.blocking_lock();
            stream.write_all(&frame)?;
            stream.flush()?;
            if !expect_reply {
                return Ok(None);
            }
            read_reply(&mut *stream, &terminator, timeout).map(Some)
        })
        .await
        .map_err(|e| TransportError::Task(e.to_string()))??;

        if let Some(reply) = &reply {
            debug!("<- {}", reply);
        }
        Ok(reply)
    }
}

/// Reads one byte at a time until the buffer ends with `terminator`, so no
/// bytes of a following message are consumed.
fn read_reply<R: Read + ?Sized>(
    reader: &mut R,
    terminator: &[u8],
    timeout: Duration,
) -> Result<String, TransportError> {
    let deadline = Instant::now() + timeout;
    let mut reply = Vec::new();
    let mut byte = [0u8; 1];

    while !reply.ends_with(terminator) {
        if Instant::now() >= deadline {
            return Err(TransportError::Timeout(timeout));
        }
        match reader.read(&mut byte) {
            Ok(0) => return Err(TransportError::Disconnected),
            Ok(_) => reply.push(byte[0]),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e.into()),
        }
    }

    reply.truncate(reply.len() - terminator.len());
    String::from_utf8(reply).map_err(|e| TransportError::Malformed(e.to_string()))
}

#[cfg(feature = "instrument_serial")]
impl SerialTransport {
    /// Open an RS-232 port.
    pub fn open_serial(
        port: &str,
        baud_rate: u32,
        termination: Termination,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let serial = serialport::new(port, baud_rate)
            .timeout(POLL_INTERVAL.min(timeout))
            .open()?;
        Ok(Self::new(serial, termination, timeout))
    }
}

impl TcpTransport {
    /// Connect to a raw TCP socket, e.g. `"192.168.1.50:5025"`.
    pub fn connect_tcp(
        address: &str,
        termination: Termination,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let socket_addr = address.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("no address resolved for '{address}'"),
            )
        })?;
        let stream = TcpStream::connect_timeout(&socket_addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream, termination, timeout))
    }
}

#[async_trait]
impl<S> MessageTransport for StreamTransport<S>
where
    S: Read + Write + Send + 'static,
{
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        self.exchange(command, false).await.map(|_| ())
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.exchange(command, true)
            .await
            .map(Option::unwrap_or_default)
    }
}

//! Message transports.
//!
//! The driver only needs two primitives from its channel: send a command, and
//! send a command then read one reply. [`MessageTransport`] is that seam; the
//! driver owns one transport exclusively and never shares it.
//!
//! - [`StreamTransport`] frames commands over any blocking byte stream
//!   (RS-232 through `serialport`, or a raw TCP socket).
//! - [`MockTransport`] simulates the instrument in memory for tests.

pub mod mock;
pub mod stream;

pub use mock::MockTransport;
#[cfg(feature = "instrument_serial")]
pub use stream::SerialTransport;
pub use stream::{StreamTransport, TcpTransport};

use crate::config::ConnectionConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Line-terminated write/query channel to an instrument.
///
/// Implementations own framing and timeouts. Commands and replies cross this
/// boundary without terminators.
#[async_trait]
pub trait MessageTransport: Send {
    /// Send a command without reading a reply.
    async fn write(&mut self, command: &str) -> Result<(), TransportError>;

    /// Send a command and return the reply, terminator stripped.
    async fn query(&mut self, command: &str) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: MessageTransport + ?Sized> MessageTransport for Box<T> {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        (**self).write(command).await
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        (**self).query(command).await
    }
}

/// Line terminators applied at connection setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    /// Appended to every command written.
    #[serde(default = "default_terminator")]
    pub write: String,
    /// Marks the end of every reply read.
    #[serde(default = "default_terminator")]
    pub read: String,
}

fn default_terminator() -> String {
    "\r\n".to_string()
}

impl Default for Termination {
    fn default() -> Self {
        Self {
            write: default_terminator(),
            read: default_terminator(),
        }
    }
}

impl Termination {
    /// Bytes on the wire for `command`.
    pub fn frame(&self, command: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(command.len() + self.write.len());
        bytes.extend_from_slice(command.as_bytes());
        bytes.extend_from_slice(self.write.as_bytes());
        bytes
    }
}

/// Opens the transport described by `connection`.
///
/// Blocking device setup runs on Tokio's blocking pool.
pub async fn open(
    connection: &ConnectionConfig,
    termination: Termination,
    timeout: Duration,
) -> Result<Box<dyn MessageTransport>, TransportError> {
    let connection = connection.clone();
    tokio::task::spawn_blocking(move || open_blocking(&connection, termination, timeout))
        .await
        .map_err(|e| TransportError::Task(e.to_string()))?
}

fn open_blocking(
    connection: &ConnectionConfig,
    termination: Termination,
    timeout: Duration,
) -> Result<Box<dyn MessageTransport>, TransportError> {
    match connection {
        ConnectionConfig::Serial { port, baud_rate } => {
            #[cfg(feature = "instrument_serial")]
            {
                let transport = SerialTransport::open_serial(port, *baud_rate, termination, timeout)?;
                info!("Opened serial port '{}' at {} baud", port, baud_rate);
                Ok(Box::new(transport))
            }

            #[cfg(not(feature = "instrument_serial"))]
            {
                let _ = (port, baud_rate, termination, timeout);
                Err(TransportError::FeatureDisabled("instrument_serial"))
            }
        }
        ConnectionConfig::Tcp { address } => {
            let transport = TcpTransport::connect_tcp(address, termination, timeout)?;
            info!("Connected to '{}'", address);
            Ok(Box::new(transport))
        }
    }
}

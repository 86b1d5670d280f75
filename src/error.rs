//! Error types for the SG396 driver.
//!
//! Two layers of errors exist:
//!
//! - **`TransportError`**: failures of the message channel itself (I/O,
//!   timeouts, a closed connection, undecodable bytes). The adapter never
//!   inspects or retries these; they travel to the caller verbatim inside
//!   [`Sg396Error::Transport`].
//! - **`Sg396Error`**: everything the property adapter can reject on its own,
//!   such as the unimplemented `rf_pll_loop_filter_mode` property, a toggle
//!   reply outside its `'1'`/`'0'` table, or a value that cannot be formatted.
//!
//! By using `#[from]`, a `TransportError` converts into `Sg396Error` with the
//! `?` operator.

use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, Sg396Error>;

/// Failure of the underlying message transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O error reported by the byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete reply arrived within the transport timeout.
    #[error("Timed out after {0:?} waiting for reply")]
    Timeout(Duration),

    /// The remote end closed the connection.
    #[error("Connection closed by instrument")]
    Disconnected,

    /// The reply could not be decoded.
    #[error("Malformed reply: {0}")]
    Malformed(String),

    /// The transport has no open connection.
    #[error("Transport not connected")]
    NotConnected,

    /// A compile-time feature needed for this transport is missing.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureDisabled(&'static str),

    /// The blocking I/O task failed to complete.
    #[error("Transport I/O task failed: {0}")]
    Task(String),

    /// Error opening or configuring a serial port.
    #[cfg(feature = "instrument_serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Error returned by the SG396 property adapter.
#[derive(Error, Debug)]
pub enum Sg396Error {
    /// The property exists on the instrument but is not mapped by this driver.
    #[error("Property '{property}' is not supported by this driver")]
    NotSupported {
        /// Property name.
        property: &'static str,
    },

    /// The transport failed; passed through unchanged.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A toggle reply did not match any entry of its value table.
    #[error("Unrecognized reply {reply:?} for property '{property}'")]
    UnrecognizedReply {
        /// Property name.
        property: &'static str,
        /// Raw reply text.
        reply: String,
    },

    /// A numeric reply could not be parsed as a finite number.
    #[error("Invalid numeric reply {reply:?} for property '{property}'")]
    InvalidNumericReply {
        /// Property name.
        property: &'static str,
        /// Raw reply text.
        reply: String,
    },

    /// A value cannot be written to the instrument.
    #[error("Invalid value {value} for property '{property}'")]
    InvalidValue {
        /// Property name.
        property: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A value of the wrong kind was passed to the generic setter.
    #[error("Property '{property}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Property name.
        property: &'static str,
        /// Kind the property accepts.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },

    /// The connection configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No property has the given name.
    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    /// Text could not be parsed as a value for the property.
    #[error("Cannot parse {input:?} as a value for property '{property}'")]
    InvalidInput {
        /// Property name.
        property: &'static str,
        /// Rejected input text.
        input: String,
    },
}

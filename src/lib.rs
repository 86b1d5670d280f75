//! Driver library for the Stanford Research Systems SG396 RF signal generator.
//!
//! The crate maps the generator's properties (amplitudes, output toggles,
//! frequency, phase) onto the instrument's ASCII command set and sends them
//! over an injected [`transport::MessageTransport`]. It is used by the
//! `sg396` command-line tool and can be embedded in larger acquisition
//! applications.
//!
//! - [`instrument`]: the [`Sg396`] driver
//! - [`property`]: the static property table and value codecs
//! - [`transport`]: serial, TCP and mock transports
//! - [`config`]: Figment-based connection configuration
//! - [`units`]: frequency and angle values

pub mod config;
pub mod error;
pub mod instrument;
pub mod property;
pub mod transport;
pub mod units;

pub use config::{ConfigError, ConnectionConfig, Sg396Config};
pub use error::{Result, Sg396Error, TransportError};
pub use instrument::{Sg396, Sg396State};
pub use property::{Property, PropertyValue};
pub use units::{Angle, Frequency};

//! Stanford Research Systems SG396 RF signal generator driver
//!
//! This module provides [`Sg396`], a thin adapter that maps the generator's
//! properties onto ASCII commands sent through a [`MessageTransport`].
//!
//! Every operation is one exchange on the transport: a setter writes one
//! command, a getter sends one query and parses its reply. There is no
//! caching and no retry; transport errors reach the caller unchanged.
//!
//! ## Configuration
//!
//! ```toml
//! [connection]
//! type = "serial"
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use sg396::{Frequency, Sg396, Sg396Config};
//!
//! # async fn run() -> sg396::Result<()> {
//! let mut sg = Sg396::connect(&Sg396Config::serial("/dev/ttyUSB0")).await?;
//! sg.set_frequency(Frequency::from_mhz(10.0)).await?;
//! sg.set_rf_amplitude(-10.0).await?;
//! sg.set_rf_toggle(true).await?;
//! println!("{}", sg.frequency().await?);
//! # Ok(())
//! # }
//! ```

use crate::config::Sg396Config;
use crate::error::{Result, Sg396Error};
use crate::property::{Property, PropertyValue};
use crate::transport::{self, MessageTransport};
use crate::units::{Angle, Frequency};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resets the carrier phase to zero degrees.
const REL_PHASE: &str = "RPHS";

/// IEEE-488.2 identification query.
const IDENTIFY: &str = "*IDN?";

/// One reading of every implemented property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sg396State {
    /// Low frequency amplitude (BNC output)
    pub lf_amplitude: f64,
    /// RF amplitude (Type N output)
    pub rf_amplitude: f64,
    /// Low frequency output state
    pub lf_toggle: bool,
    /// RF output state
    pub rf_toggle: bool,
    /// Signal frequency
    pub frequency: Frequency,
    /// Low frequency offset voltage
    pub lf_offset: f64,
    /// Carrier phase
    pub phase: Angle,
}

/// SG396 driver over an injected transport.
pub struct Sg396<T> {
    transport: T,
}

impl Sg396<Box<dyn MessageTransport>> {
    /// Open the transport described by `config` and wrap it.
    pub async fn connect(config: &Sg396Config) -> Result<Self> {
        config.validate()?;
        let transport = transport::open(
            &config.connection,
            config.termination.clone(),
            config.timeout(),
        )
        .await?;
        Ok(Self::new(transport))
    }
}

impl<T: MessageTransport> Sg396<T> {
    /// Wrap an already open transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the underlying transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Read `property` from the instrument.
    ///
    /// Unimplemented properties fail with `NotSupported` before any
    /// transport call.
    pub async fn get(&mut self, property: Property) -> Result<PropertyValue> {
        let descriptor = property.descriptor();
        let (query, _) = descriptor.commands()?;
        let reply = self.transport.query(query).await?;
        descriptor.decode(&reply)
    }

    /// Write `value` to `property`.
    ///
    /// The value is encoded before anything is sent, so unimplemented
    /// properties, mismatched kinds and non-finite numbers never reach the
    /// transport.
    pub async fn set(&mut self, property: Property, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let command = property.descriptor().encode(value)?;
        self.transport.write(&command).await?;
        debug!("Set {} to {}", property, value);
        Ok(())
    }

    /// Low frequency amplitude (BNC output).
    pub async fn lf_amplitude(&mut self) -> Result<f64> {
        self.get_number(Property::LfAmplitude).await
    }

    /// Set the low frequency amplitude.
    pub async fn set_lf_amplitude(&mut self, value: f64) -> Result<()> {
        self.set(Property::LfAmplitude, value).await
    }

    /// RF amplitude (Type N output).
    pub async fn rf_amplitude(&mut self) -> Result<f64> {
        self.get_number(Property::RfAmplitude).await
    }

    /// Set the RF amplitude.
    pub async fn set_rf_amplitude(&mut self, value: f64) -> Result<()> {
        self.set(Property::RfAmplitude, value).await
    }

    /// Low frequency output state.
    pub async fn lf_toggle(&mut self) -> Result<bool> {
        self.get_toggle(Property::LfToggle).await
    }

    /// Enable or disable the low frequency output.
    pub async fn set_lf_toggle(&mut self, on: bool) -> Result<()> {
        self.set(Property::LfToggle, on).await
    }

    /// RF output state.
    pub async fn rf_toggle(&mut self) -> Result<bool> {
        self.get_toggle(Property::RfToggle).await
    }

    /// Enable or disable the RF output.
    pub async fn set_rf_toggle(&mut self, on: bool) -> Result<()> {
        self.set(Property::RfToggle, on).await
    }

    /// Signal frequency.
    pub async fn frequency(&mut self) -> Result<Frequency> {
        match self.get(Property::Frequency).await? {
            PropertyValue::Frequency(freq) => Ok(freq),
            other => Err(unexpected(Property::Frequency, "a frequency", &other)),
        }
    }

    /// Set the signal frequency.
    pub async fn set_frequency(&mut self, frequency: Frequency) -> Result<()> {
        self.set(Property::Frequency, frequency).await
    }

    /// RF PLL loop filter mode. Always fails with `NotSupported`.
    pub async fn rf_pll_loop_filter_mode(&mut self) -> Result<PropertyValue> {
        self.get(Property::RfPllLoopFilterMode).await
    }

    /// Set the RF PLL loop filter mode. Always fails with `NotSupported`.
    pub async fn set_rf_pll_loop_filter_mode(&mut self, value: impl Into<PropertyValue>) -> Result<()> {
        self.set(Property::RfPllLoopFilterMode, value).await
    }

    /// Low frequency offset voltage.
    pub async fn lf_offset(&mut self) -> Result<f64> {
        self.get_number(Property::LfOffset).await
    }

    /// Set the low frequency offset voltage.
    pub async fn set_lf_offset(&mut self, value: f64) -> Result<()> {
        self.set(Property::LfOffset, value).await
    }

    /// Carrier phase.
    pub async fn phase(&mut self) -> Result<Angle> {
        match self.get(Property::Phase).await? {
            PropertyValue::Angle(angle) => Ok(angle),
            other => Err(unexpected(Property::Phase, "an angle", &other)),
        }
    }

    /// Set the carrier phase.
    pub async fn set_phase(&mut self, phase: Angle) -> Result<()> {
        self.set(Property::Phase, phase).await
    }

    /// Set the carrier phase to 0 degrees without changing the output.
    pub async fn rel_phase(&mut self) -> Result<()> {
        self.transport.write(REL_PHASE).await?;
        Ok(())
    }

    /// Identity string reported by `*IDN?`.
    pub async fn identify(&mut self) -> Result<String> {
        let reply = self.transport.query(IDENTIFY).await?;
        Ok(reply.trim().to_string())
    }

    /// Read every implemented property, in table order.
    pub async fn snapshot(&mut self) -> Result<Sg396State> {
        Ok(Sg396State {
            lf_amplitude: self.lf_amplitude().await?,
            rf_amplitude: self.rf_amplitude().await?,
            lf_toggle: self.lf_toggle().await?,
            rf_toggle: self.rf_toggle().await?,
            frequency: self.frequency().await?,
            lf_offset: self.lf_offset().await?,
            phase: self.phase().await?,
        })
    }

    /// Write every property of `state`, in table order.
    pub async fn apply(&mut self, state: &Sg396State) -> Result<()> {
        self.set_lf_amplitude(state.lf_amplitude).await?;
        self.set_rf_amplitude(state.rf_amplitude).await?;
        self.set_lf_toggle(state.lf_toggle).await?;
        self.set_rf_toggle(state.rf_toggle).await?;
        self.set_frequency(state.frequency).await?;
        self.set_lf_offset(state.lf_offset).await?;
        self.set_phase(state.phase).await
    }

    async fn get_number(&mut self, property: Property) -> Result<f64> {
        match self.get(property).await? {
            PropertyValue::Number(v) => Ok(v),
            other => Err(unexpected(property, "a number", &other)),
        }
    }

    async fn get_toggle(&mut self, property: Property) -> Result<bool> {
        match self.get(property).await? {
            PropertyValue::Toggle(on) => Ok(on),
            other => Err(unexpected(property, "a toggle", &other)),
        }
    }
}

fn unexpected(property: Property, expected: &'static str, found: &PropertyValue) -> Sg396Error {
    Sg396Error::TypeMismatch {
        property: property.name(),
        expected,
        found: found.kind(),
    }
}

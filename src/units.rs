//! Unit-bearing values for the frequency and phase properties.
//!
//! The instrument speaks hertz and degrees. [`Frequency`] and [`Angle`] carry
//! their magnitude in those units internally, so a value built from megahertz
//! or radians is converted before it is formatted into a command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text could not be parsed as a quantity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} {input:?}")]
pub struct ParseQuantityError {
    kind: &'static str,
    input: String,
}

/// Physical units known to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Hertz.
    Hertz,
    /// Degrees of arc.
    Degrees,
}

impl Unit {
    /// Symbol appended when displaying a value in this unit.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Hertz => "Hz",
            Unit::Degrees => "deg",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A frequency, stored in hertz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(f64);

impl Frequency {
    /// Frequency of `hz` hertz.
    pub const fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    /// Frequency of `khz` kilohertz.
    pub fn from_khz(khz: f64) -> Self {
        Self(khz * 1e3)
    }

    /// Frequency of `mhz` megahertz.
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1e6)
    }

    /// Frequency of `ghz` gigahertz.
    pub fn from_ghz(ghz: f64) -> Self {
        Self(ghz * 1e9)
    }

    /// Magnitude in hertz.
    pub const fn as_hz(self) -> f64 {
        self.0
    }

    /// Magnitude in megahertz.
    pub fn as_mhz(self) -> f64 {
        self.0 / 1e6
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, Unit::Hertz)
    }
}

impl FromStr for Frequency {
    type Err = ParseQuantityError;

    /// Parses `"1000"`, `"1000 Hz"`, `"2.5kHz"`, `"10 MHz"` or `"1.2 GHz"`.
    /// A bare number is taken as hertz. Prefixes are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const SCALES: [(&str, f64); 4] = [("GHz", 1e9), ("MHz", 1e6), ("kHz", 1e3), ("Hz", 1.0)];
        let (magnitude, scale) = split_suffix(s, &SCALES);
        parse_magnitude(magnitude, "frequency", s).map(|v| Self(v * scale))
    }
}

/// An angle, stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    /// Angle of `degrees` degrees.
    pub const fn from_degrees(degrees: f64) -> Self {
        Self(degrees)
    }

    /// Angle of `radians` radians.
    pub fn from_radians(radians: f64) -> Self {
        Self(radians.to_degrees())
    }

    /// Magnitude in degrees.
    pub const fn as_degrees(self) -> f64 {
        self.0
    }

    /// Magnitude in radians.
    pub fn as_radians(self) -> f64 {
        self.0.to_radians()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, Unit::Degrees)
    }
}

impl FromStr for Angle {
    type Err = ParseQuantityError;

    /// Parses `"45"`, `"45 deg"`, `"45°"` or `"1.57 rad"`. A bare number is
    /// taken as degrees.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const SCALES: [(&str, f64); 5] = [
            ("degrees", 1.0),
            ("deg", 1.0),
            ("°", 1.0),
            ("radians", 180.0 / std::f64::consts::PI),
            ("rad", 180.0 / std::f64::consts::PI),
        ];
        let (magnitude, scale) = split_suffix(s, &SCALES);
        parse_magnitude(magnitude, "angle", s).map(|v| Self(v * scale))
    }
}

fn split_suffix<'a>(s: &'a str, scales: &[(&str, f64)]) -> (&'a str, f64) {
    let s = s.trim();
    scales
        .iter()
        .find_map(|(suffix, scale)| s.strip_suffix(suffix).map(|rest| (rest.trim_end(), *scale)))
        .unwrap_or((s, 1.0))
}

fn parse_magnitude(magnitude: &str, kind: &'static str, input: &str) -> Result<f64, ParseQuantityError> {
    magnitude
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseQuantityError {
            kind,
            input: input.to_string(),
        })
}

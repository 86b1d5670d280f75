//! Static property table of the SG396.
//!
//! Each instrument property is described once by a [`PropertyDescriptor`]:
//! its query and write commands, the [`Codec`] that turns values into command
//! arguments and replies back into values, and a short description. The
//! driver's generic `get`/`set` dispatcher is driven entirely by this table.
//!
//! | Property | Query | Write | Encoding |
//! |---|---|---|---|
//! | `lf_amplitude` | `AMPL?` | `AMPL<v:.2>` | number |
//! | `rf_amplitude` | `AMPR?` | `AMPR<v:.2>` | number |
//! | `lf_toggle` | `ENBL?` | `ENBL<1/0>` | toggle |
//! | `rf_toggle` | `ENBR?` | `ENBR<1/0>` | toggle |
//! | `frequency` | `FREQ?` | `FREQ<v:.2>` | Hz |
//! | `rf_pll_loop_filter_mode` | - | - | not implemented |
//! | `lf_offset` | `OFSL?` | `OFSL<v:.2>` | number |
//! | `phase` | `PHAS?` | `PHAS<v:.2>` | degrees |

use crate::error::{Result, Sg396Error};
use crate::units::{Angle, Frequency, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named properties of the SG396.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Low frequency amplitude (BNC output).
    LfAmplitude,
    /// RF amplitude (Type N output).
    RfAmplitude,
    /// Low frequency output state.
    LfToggle,
    /// RF output state.
    RfToggle,
    /// Signal frequency.
    Frequency,
    /// RF PLL loop filter mode. Not mapped.
    RfPllLoopFilterMode,
    /// Low frequency offset voltage.
    LfOffset,
    /// Carrier phase.
    Phase,
}

impl Property {
    /// Every property, in table order.
    pub const ALL: [Property; 8] = [
        Property::LfAmplitude,
        Property::RfAmplitude,
        Property::LfToggle,
        Property::RfToggle,
        Property::Frequency,
        Property::RfPllLoopFilterMode,
        Property::LfOffset,
        Property::Phase,
    ];

    /// Descriptor for this property.
    pub fn descriptor(self) -> &'static PropertyDescriptor {
        // PROPERTIES is laid out in declaration order.
        &PROPERTIES[self as usize]
    }

    /// Snake-case property name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = Sg396Error;

    fn from_str(s: &str) -> Result<Self> {
        PROPERTIES
            .iter()
            .find(|d| d.name == s)
            .map(|d| d.property)
            .ok_or_else(|| Sg396Error::UnknownProperty(s.to_string()))
    }
}

/// Finite table mapping a boolean to its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTable {
    /// Code sent for `true`.
    pub on: &'static str,
    /// Code sent for `false`.
    pub off: &'static str,
}

/// The `'1'`/`'0'` table used by both output toggles.
pub const ON_OFF: ToggleTable = ToggleTable { on: "1", off: "0" };

impl ToggleTable {
    /// Wire code for `value`.
    pub fn encode(&self, value: bool) -> &'static str {
        if value {
            self.on
        } else {
            self.off
        }
    }

    /// Exact-match lookup of a reply.
    pub fn decode(&self, reply: &str) -> Option<bool> {
        if reply == self.on {
            Some(true)
        } else if reply == self.off {
            Some(false)
        } else {
            None
        }
    }
}

/// Value encoding of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Plain number written with two decimals.
    Number,
    /// Number in a declared unit, written with two decimals.
    Quantity(Unit),
    /// Boolean mapped through a table.
    Toggle(ToggleTable),
}

impl Codec {
    /// Human-readable kind, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Codec::Number => "a number",
            Codec::Quantity(Unit::Hertz) => "a frequency",
            Codec::Quantity(Unit::Degrees) => "an angle",
            Codec::Toggle(_) => "a toggle",
        }
    }
}

/// How a property is reached on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Mapped to a query and a write command.
    Mapped {
        /// Query command, e.g. `AMPL?`.
        query: &'static str,
        /// Write mnemonic the encoded value is appended to, e.g. `AMPL`.
        write: &'static str,
    },
    /// Exists on the instrument but is not mapped by the driver.
    NotImplemented,
}

/// Static description of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property this entry describes.
    pub property: Property,
    /// Snake-case name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Wire commands.
    pub access: Access,
    /// Value encoding.
    pub codec: Codec,
}

impl PropertyDescriptor {
    /// Whether the driver can read and write this property.
    pub fn is_implemented(&self) -> bool {
        matches!(self.access, Access::Mapped { .. })
    }

    /// Declared unit, if any.
    pub fn unit(&self) -> Option<Unit> {
        match self.codec {
            Codec::Quantity(unit) => Some(unit),
            _ => None,
        }
    }

    /// Query and write commands, or `NotSupported`.
    pub fn commands(&self) -> Result<(&'static str, &'static str)> {
        match self.access {
            Access::Mapped { query, write } => Ok((query, write)),
            Access::NotImplemented => Err(Sg396Error::NotSupported {
                property: self.name,
            }),
        }
    }

    /// Builds the write command for `value`.
    ///
    /// Numbers are formatted with exactly two decimals, rounding the exact
    /// binary value half-to-even, and appended to the mnemonic without a
    /// separator. Fails without side effects if the property is not mapped,
    /// the value is of the wrong kind, or the number is not finite.
    pub fn encode(&self, value: PropertyValue) -> Result<String> {
        let (_, mnemonic) = self.commands()?;
        let argument = match (self.codec, value) {
            (Codec::Toggle(table), PropertyValue::Toggle(on)) => table.encode(on).to_string(),
            (Codec::Number | Codec::Quantity(_), PropertyValue::Number(v)) => {
                self.format_number(v)?
            }
            (Codec::Quantity(Unit::Hertz), PropertyValue::Frequency(freq)) => {
                self.format_number(freq.as_hz())?
            }
            (Codec::Quantity(Unit::Degrees), PropertyValue::Angle(angle)) => {
                self.format_number(angle.as_degrees())?
            }
            (codec, value) => {
                return Err(Sg396Error::TypeMismatch {
                    property: self.name,
                    expected: codec.kind(),
                    found: value.kind(),
                })
            }
        };
        Ok(format!("{mnemonic}{argument}"))
    }

    /// Parses a query reply into a value.
    pub fn decode(&self, reply: &str) -> Result<PropertyValue> {
        self.commands()?;
        match self.codec {
            Codec::Toggle(table) => {
                table
                    .decode(reply)
                    .map(PropertyValue::Toggle)
                    .ok_or_else(|| Sg396Error::UnrecognizedReply {
                        property: self.name,
                        reply: reply.to_string(),
                    })
            }
            Codec::Number => self.parse_number(reply).map(PropertyValue::Number),
            Codec::Quantity(Unit::Hertz) => self
                .parse_number(reply)
                .map(|v| PropertyValue::Frequency(Frequency::from_hz(v))),
            Codec::Quantity(Unit::Degrees) => self
                .parse_number(reply)
                .map(|v| PropertyValue::Angle(Angle::from_degrees(v))),
        }
    }

    fn format_number(&self, value: f64) -> Result<String> {
        if !value.is_finite() {
            return Err(Sg396Error::InvalidValue {
                property: self.name,
                value,
            });
        }
        Ok(format!("{value:.2}"))
    }

    fn parse_number(&self, reply: &str) -> Result<f64> {
        reply
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Sg396Error::InvalidNumericReply {
                property: self.name,
                reply: reply.to_string(),
            })
    }
}

/// The property table, in [`Property`] declaration order.
pub static PROPERTIES: [PropertyDescriptor; 8] = [
    PropertyDescriptor {
        property: Property::LfAmplitude,
        name: "lf_amplitude",
        description: "low frequency amplitude (BNC output)",
        access: Access::Mapped {
            query: "AMPL?",
            write: "AMPL",
        },
        codec: Codec::Number,
    },
    PropertyDescriptor {
        property: Property::RfAmplitude,
        name: "rf_amplitude",
        description: "RF amplitude (Type N output)",
        access: Access::Mapped {
            query: "AMPR?",
            write: "AMPR",
        },
        codec: Codec::Number,
    },
    PropertyDescriptor {
        property: Property::LfToggle,
        name: "lf_toggle",
        description: "low frequency output state",
        access: Access::Mapped {
            query: "ENBL?",
            write: "ENBL",
        },
        codec: Codec::Toggle(ON_OFF),
    },
    PropertyDescriptor {
        property: Property::RfToggle,
        name: "rf_toggle",
        description: "RF output state",
        access: Access::Mapped {
            query: "ENBR?",
            write: "ENBR",
        },
        codec: Codec::Toggle(ON_OFF),
    },
    PropertyDescriptor {
        property: Property::Frequency,
        name: "frequency",
        description: "signal frequency",
        access: Access::Mapped {
            query: "FREQ?",
            write: "FREQ",
        },
        codec: Codec::Quantity(Unit::Hertz),
    },
    PropertyDescriptor {
        property: Property::RfPllLoopFilterMode,
        name: "rf_pll_loop_filter_mode",
        description: "RF PLL loop filter mode",
        access: Access::NotImplemented,
        codec: Codec::Number,
    },
    PropertyDescriptor {
        property: Property::LfOffset,
        name: "lf_offset",
        description: "low frequency offset voltage",
        access: Access::Mapped {
            query: "OFSL?",
            write: "OFSL",
        },
        codec: Codec::Number,
    },
    PropertyDescriptor {
        property: Property::Phase,
        name: "phase",
        description: "carrier phase",
        access: Access::Mapped {
            query: "PHAS?",
            write: "PHAS",
        },
        codec: Codec::Quantity(Unit::Degrees),
    },
];

/// A value read from or written to a property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Unitless number.
    Number(f64),
    /// Output state.
    Toggle(bool),
    /// Frequency.
    Frequency(Frequency),
    /// Phase angle.
    Angle(Angle),
}

impl PropertyValue {
    /// Human-readable kind, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Number(_) => "a number",
            PropertyValue::Toggle(_) => "a toggle",
            PropertyValue::Frequency(_) => "a frequency",
            PropertyValue::Angle(_) => "an angle",
        }
    }

    /// Parses user text according to the codec of `property`.
    ///
    /// Toggles accept `1/0`, `true/false` and `on/off`. Unit-tagged properties
    /// accept a unit suffix (`"1.5 MHz"`, `"90 deg"`); a bare number is in the
    /// declared unit.
    pub fn parse_for(property: Property, input: &str) -> Result<Self> {
        let descriptor = property.descriptor();
        let invalid = || Sg396Error::InvalidInput {
            property: descriptor.name,
            input: input.to_string(),
        };
        let text = input.trim();
        match descriptor.codec {
            Codec::Toggle(_) => match text.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Ok(PropertyValue::Toggle(true)),
                "0" | "false" | "off" => Ok(PropertyValue::Toggle(false)),
                _ => Err(invalid()),
            },
            Codec::Number => text
                .parse::<f64>()
                .map(PropertyValue::Number)
                .map_err(|_| invalid()),
            Codec::Quantity(Unit::Hertz) => text
                .parse::<Frequency>()
                .map(PropertyValue::Frequency)
                .map_err(|_| invalid()),
            Codec::Quantity(Unit::Degrees) => text
                .parse::<Angle>()
                .map(PropertyValue::Angle)
                .map_err(|_| invalid()),
        }
    }

    /// The number carried by `Number`, `Frequency` (Hz) or `Angle` (degrees).
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::Number(v) => Some(v),
            PropertyValue::Frequency(f) => Some(f.as_hz()),
            PropertyValue::Angle(a) => Some(a.as_degrees()),
            PropertyValue::Toggle(_) => None,
        }
    }

    /// The flag carried by `Toggle`.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Toggle(on) => Some(on),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(v) => write!(f, "{v}"),
            PropertyValue::Toggle(on) => write!(f, "{on}"),
            PropertyValue::Frequency(freq) => write!(f, "{freq}"),
            PropertyValue::Angle(angle) => write!(f, "{angle}"),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Toggle(value)
    }
}

impl From<Frequency> for PropertyValue {
    fn from(value: Frequency) -> Self {
        PropertyValue::Frequency(value)
    }
}

impl From<Angle> for PropertyValue {
    fn from(value: Angle) -> Self {
        PropertyValue::Angle(value)
    }
}

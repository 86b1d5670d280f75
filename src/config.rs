//! Connection configuration using Figment.
//!
//! Configuration is loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables prefixed with `SG396_`
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! SG396_TIMEOUT_MS=2000
//! SG396_CONNECTION__PORT=/dev/ttyUSB1
//! SG396_TERMINATION__READ="\n"
//! ```
//!
//! # Example file
//!
//! ```toml
//! timeout_ms = 1000
//!
//! [connection]
//! type = "serial"
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! ```

use crate::transport::Termination;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be read or deserialized.
    #[error("Configuration load error: {0}")]
    Load(#[from] figment::Error),
    /// The configuration was read but holds invalid values.
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Top-level driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sg396Config {
    /// How to reach the instrument
    pub connection: ConnectionConfig,
    /// Line terminators
    #[serde(default)]
    pub termination: Termination,
    /// Reply timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Physical link to the instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionConfig {
    /// RS-232 port
    Serial {
        /// Port path (e.g., "/dev/ttyUSB0", "COM3")
        port: String,
        /// Baud rate
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
    /// Raw TCP socket
    Tcp {
        /// Host and port (e.g., "192.168.1.50:5025")
        address: String,
    },
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_baud_rate() -> u32 {
    115_200
}

impl Sg396Config {
    /// Configuration for a serial port with default settings.
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_connection(ConnectionConfig::Serial {
            port: port.into(),
            baud_rate: default_baud_rate(),
        })
    }

    /// Configuration for a TCP socket with default settings.
    pub fn tcp(address: impl Into<String>) -> Self {
        Self::with_connection(ConnectionConfig::Tcp {
            address: address.into(),
        })
    }

    fn with_connection(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            termination: Termination::default(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Load configuration from a TOML file and `SG396_` environment variables
    ///
    /// Environment variables take precedence over the file. A missing file is
    /// not an error as long as the environment supplies every required key.
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the configuration cannot be extracted or
    /// fails validation.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_figment(Figment::new().merge(Toml::file(path.as_ref())))
    }

    /// Load configuration from `SG396_` environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Figment::new())
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .merge(Env::prefixed("SG396_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Timeout is non-zero
    /// - Both terminators are non-empty
    /// - Serial port name is non-empty and baud rate non-zero
    /// - TCP address is non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.termination.write.is_empty() || self.termination.read.is_empty() {
            return Err(ConfigError::Validation(
                "termination.write and termination.read must not be empty".to_string(),
            ));
        }

        match &self.connection {
            ConnectionConfig::Serial { port, baud_rate } => {
                if port.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "connection.port must not be empty".to_string(),
                    ));
                }
                if *baud_rate == 0 {
                    return Err(ConfigError::Validation(format!(
                        "Invalid baud_rate {} for port '{}'",
                        baud_rate, port
                    )));
                }
            }
            ConnectionConfig::Tcp { address } => {
                if address.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "connection.address must not be empty".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Reply timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_serial_config() {
        let file = write_config(
            r#"
timeout_ms = 2500

[connection]
type = "serial"
port = "/dev/ttyUSB0"
baud_rate = 9600
"#,
        );
        let config = Sg396Config::load_from(file.path()).unwrap();
        assert_eq!(
            config.connection,
            ConnectionConfig::Serial {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 9600,
            }
        );
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.termination, Termination::default());
    }

    #[test]
    #[serial]
    fn test_load_tcp_config_with_termination() {
        let file = write_config(
            r#"
[connection]
type = "tcp"
address = "192.168.1.50:5025"

[termination]
read = "\n"
"#,
        );
        let config = Sg396Config::load_from(file.path()).unwrap();
        assert_eq!(config, {
            let mut expected = Sg396Config::tcp("192.168.1.50:5025");
            expected.termination.read = "\n".to_string();
            expected
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config(
            r#"
[connection]
type = "serial"
port = "/dev/ttyUSB0"
"#,
        );
        std::env::set_var("SG396_CONNECTION__PORT", "/dev/ttyUSB7");
        std::env::set_var("SG396_TIMEOUT_MS", "300");
        let result = Sg396Config::load_from(file.path());
        std::env::remove_var("SG396_CONNECTION__PORT");
        std::env::remove_var("SG396_TIMEOUT_MS");

        let config = result.unwrap();
        assert_eq!(
            config.connection,
            ConnectionConfig::Serial {
                port: "/dev/ttyUSB7".to_string(),
                baud_rate: 115_200,
            }
        );
        assert_eq!(config.timeout_ms, 300);
    }

    #[test]
    #[serial]
    fn test_missing_connection_is_load_error() {
        let file = write_config("timeout_ms = 100\n");
        assert!(matches!(
            Sg396Config::load_from(file.path()),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Sg396Config::serial("");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config = Sg396Config::serial("/dev/ttyUSB0");
        config.timeout_ms = 0;
        assert!(config.validate().is_err());

        config = Sg396Config::serial("/dev/ttyUSB0");
        config.termination.write.clear();
        assert!(config.validate().is_err());

        config = Sg396Config::tcp(" ");
        assert!(config.validate().is_err());

        assert!(Sg396Config::serial("COM3").validate().is_ok());
    }
}

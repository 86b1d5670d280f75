//! Command-line control of an SG396 signal generator.
//!
//! ```bash
//! sg396 list
//! sg396 --port /dev/ttyUSB0 set frequency "10 MHz"
//! sg396 --tcp 192.168.1.50:5025 get rf_toggle
//! sg396 --config config/sg396.toml snapshot
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sg396::property::{Access, PROPERTIES};
use sg396::{ConnectionConfig, Property, PropertyValue, Sg396, Sg396Config};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sg396", version, about = "Control an SRS SG396 RF signal generator")]
struct Cli {
    /// Configuration file, used when neither --port nor --tcp is given
    #[arg(long, default_value = "config/sg396.toml")]
    config: PathBuf,

    /// Serial port of the instrument
    #[arg(long, conflicts_with = "tcp")]
    port: Option<String>,

    /// Baud rate for --port
    #[arg(long, requires = "port")]
    baud_rate: Option<u32>,

    /// Host and port of the instrument's raw socket (e.g. 192.168.1.50:5025)
    #[arg(long)]
    tcp: Option<String>,

    /// Reply timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the property table
    List,
    /// Read one property
    Get {
        /// Property name (see `list`)
        property: String,
    },
    /// Write one property
    Set {
        /// Property name (see `list`)
        property: String,
        /// Value, e.g. `on`, `-10`, `1.5 MHz`, `90 deg`
        value: String,
    },
    /// Set the carrier phase to 0 degrees
    RelPhase,
    /// Read every property and print it as JSON
    Snapshot,
    /// Print the instrument identity
    Identify,
}

impl Cli {
    fn resolve_config(&self) -> Result<Sg396Config> {
        let mut config = match (&self.tcp, &self.port) {
            (Some(address), _) => Sg396Config::tcp(address.clone()),
            (None, Some(port)) => {
                let mut config = Sg396Config::serial(port.clone());
                if let Some(baud_rate) = self.baud_rate {
                    config.connection = ConnectionConfig::Serial {
                        port: port.clone(),
                        baud_rate,
                    };
                }
                config
            }
            (None, None) => Sg396Config::load_from(&self.config).with_context(|| {
                format!("Failed to load configuration from '{}'", self.config.display())
            })?,
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_table() {
    println!("{:<26} {:<8} {:<8} {:<6} DESCRIPTION", "PROPERTY", "QUERY", "WRITE", "UNIT");
    for descriptor in &PROPERTIES {
        let (query, write) = match descriptor.access {
            Access::Mapped { query, write } => (query, write),
            Access::NotImplemented => ("-", "-"),
        };
        let unit = descriptor.unit().map_or("-", |u| u.symbol());
        println!(
            "{:<26} {:<8} {:<8} {:<6} {}",
            descriptor.name, query, write, unit, descriptor.description
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Command::List = cli.command {
        print_table();
        return Ok(());
    }

    let config = cli.resolve_config()?;
    info!("Connecting to SG396 via {:?}", config.connection);
    let mut sg = Sg396::connect(&config)
        .await
        .context("Failed to connect to SG396")?;

    match &cli.command {
        Command::List => print_table(),
        Command::Get { property } => {
            let property: Property = property.parse()?;
            println!("{}", sg.get(property).await?);
        }
        Command::Set { property, value } => {
            let property: Property = property.parse()?;
            let value = PropertyValue::parse_for(property, value)?;
            sg.set(property, value).await?;
        }
        Command::RelPhase => sg.rel_phase().await?,
        Command::Snapshot => {
            let state = sg.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Identify => println!("{}", sg.identify().await?),
    }

    Ok(())
}

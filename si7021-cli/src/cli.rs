use std::path::PathBuf;

use clap::Parser;
use si7021_hal::MeasurementMode;

use crate::util;

/// CLI for the Si7021 temperature and humidity sensor
///
/// This reads the sensor through a Linux I2C bus device (/dev/i2c-N).
///
/// Temperatures are reported in kelvin to one decimal place and relative
/// humidity in whole percent. The get and watch commands print the same
/// integer values a monitoring host would poll: tenths of a kelvin for
/// temperature and percent for humidity.
///
/// By default the sensor is read in no-hold mode, polling until the result is
/// ready. Hold mode relies on clock stretching, which not every I2C controller
/// supports.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// I2C bus device
    #[arg(short, long, default_value = "/dev/i2c-1")]
    pub(crate) bus: PathBuf,
    /// Sensor address in hexadecimal
    #[arg(short, long, default_value = "0x40", value_parser = util::address_from_hex)]
    pub(crate) address: u8,
    /// How to wait for a conversion
    #[arg(short, long, value_enum, default_value_t = Mode::NoHold)]
    pub(crate) mode: Mode,
    /// Number of times to poll for a no-hold result
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..))]
    pub(crate) attempts: u8,
    /// Milliseconds to wait before each poll
    #[arg(long, default_value_t = 2)]
    pub(crate) interval_ms: u64,
    /// Log more (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Parser)]
pub(crate) enum Commands {
    /// Measure the temperature.
    Temperature,
    /// Measure the relative humidity.
    Humidity,
    /// Measure humidity and temperature from a single conversion.
    Measure,
    /// Read one of the exported values (temperature, humidity).
    Get { name: String },
    /// Poll the exported values repeatedly.
    Watch {
        /// Milliseconds between polls
        #[arg(long, default_value_t = 1000)]
        period_ms: u64,
        /// Stop after this many polls
        #[arg(long)]
        count: Option<u64>,
    },
    /// Show the user and heater registers.
    Registers,
    /// Soft-reset the sensor.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Mode {
    /// Sensor holds the bus (clock stretching) until the result is ready
    Hold,
    /// Sensor releases the bus and the result is polled for
    NoHold,
}

impl From<Mode> for MeasurementMode {
    fn from(value: Mode) -> MeasurementMode {
        match value {
            Mode::Hold => MeasurementMode::Hold,
            Mode::NoHold => MeasurementMode::NoHold,
        }
    }
}

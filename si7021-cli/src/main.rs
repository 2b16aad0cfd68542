use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use linux_embedded_hal::{Delay, I2cdev};
use log::LevelFilter;
use si7021_hal::{Device, RetryPolicy, Si7021};

use cli::Commands;

mod cli;
mod sensor;
mod util;
mod watch;

pub(crate) type Sensor = Si7021<I2cdev, Delay>;
pub(crate) type Monitor = Device<I2cdev, Delay>;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let i2c = I2cdev::new(&cli.bus)
        .with_context(|| format!("could not open {}", cli.bus.display()))?;
    let retry = RetryPolicy::new(cli.attempts, Duration::from_millis(cli.interval_ms));
    let mut sensor: Sensor = Si7021::new(i2c, Delay)
        .with_address(cli.address)
        .with_mode(cli.mode.into())
        .with_retry_policy(retry);

    match cli.command {
        Commands::Measure => sensor::measure(&mut sensor)?,
        Commands::Registers => sensor::registers(&mut sensor)?,
        Commands::Reset => sensor.reset().context("reset failed")?,
        Commands::Temperature => println!("{}", start(sensor)?.temperature()?),
        Commands::Humidity => println!("{}", start(sensor)?.humidity()?),
        Commands::Get { name } => println!("{}", start(sensor)?.value(&name)?),
        Commands::Watch { period_ms, count } => {
            let device = start(sensor)?;
            watch::action(&device, Duration::from_millis(period_ms), count);
            device.stop();
        }
    }
    Ok(())
}

/// Find the sensor and start serving reads from it.
fn start(sensor: Sensor) -> anyhow::Result<Monitor> {
    let device = Device::probe(sensor)?;
    device.start().context("could not start the sensor")?;
    Ok(device)
}

/// Log warnings by default, more with each `-v`. `RUST_LOG` overrides this.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

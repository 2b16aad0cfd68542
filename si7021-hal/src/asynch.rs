//! Async driver built on `embedded-hal-async`.
//!
//! The async driver follows the same protocol as [`Si7021`](crate::Si7021). The
//! difference is that waiting for a no-hold conversion awaits the delay instead of
//! blocking, so other tasks can run while the sensor converts.
use embedded_hal::i2c::{Error as _, SevenBitAddress};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, trace, warn};

use crate::bus::AsyncBus;
use crate::commands::{Command, MeasurementMode, Quantity};
use crate::conversion::{Decikelvin, Measurement, RawHumidity, RawTemperature, RelativeHumidity};
use crate::driver::{DEFAULT_ADDRESS, RESET_TIME_US};
use crate::error::Error;
use crate::registers::{HeaterLevel, UserRegister};
use crate::retry::{CancelToken, RetryPolicy, is_busy};

/// Async driver for the Si7021.
///
/// See [`Si7021`](crate::Si7021) for a description of the measurement modes and
/// errors; they are the same here.
#[derive(Debug)]
pub struct Si7021Async<I2C, D> {
    bus: AsyncBus<I2C>,
    delay: D,
    address: SevenBitAddress,
    mode: MeasurementMode,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl<I2C, D> Si7021Async<I2C, D>
where
    I2C: I2c<SevenBitAddress>,
    D: DelayNs,
{
    /// Create a driver for a sensor at the default address.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            bus: AsyncBus::new(i2c),
            delay,
            address: DEFAULT_ADDRESS,
            mode: MeasurementMode::default(),
            retry: RetryPolicy::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Talk to the sensor at a different address.
    pub fn with_address(mut self, address: SevenBitAddress) -> Self {
        self.address = address;
        self
    }

    /// Choose between hold and no-hold measurements.
    pub fn with_mode(mut self, mode: MeasurementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Change how long no-hold reads poll for a result.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use an existing cancellation token instead of the driver's own.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle to the token checked between poll attempts.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Give back the transport and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.bus.release(), self.delay)
    }

    /// Measure the relative humidity.
    pub async fn read_relative_humidity(&mut self) -> Result<RelativeHumidity, Error<I2C::Error>> {
        let bytes = self.sample(Quantity::RelativeHumidity).await?;
        Ok(RawHumidity::from_be_bytes(bytes).into())
    }

    /// Measure the temperature.
    pub async fn read_temperature(&mut self) -> Result<Decikelvin, Error<I2C::Error>> {
        let bytes = self.sample(Quantity::Temperature).await?;
        Ok(RawTemperature::from_be_bytes(bytes).into())
    }

    /// Read the temperature measured during the last humidity conversion.
    pub async fn read_previous_temperature(&mut self) -> Result<Decikelvin, Error<I2C::Error>> {
        self.check_cancelled()?;
        let mut buf = [0u8; 2];
        self.bus
            .read_register(
                self.address,
                Command::ReadPreviousTemperature.code(),
                &mut buf,
            )
            .await
            .map_err(Error::Bus)?;
        Ok(RawTemperature::from_be_bytes(buf).into())
    }

    /// Measure humidity and read back the temperature from the same conversion.
    pub async fn measure(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let relative_humidity = self.read_relative_humidity().await?;
        let temperature = self.read_previous_temperature().await?;
        Ok(Measurement {
            relative_humidity,
            temperature,
        })
    }

    /// Soft-reset the sensor and wait for it to come back.
    pub async fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("si7021 {:#04x}: soft reset", self.address);
        self.bus
            .write_command(self.address, &[Command::Reset.code()])
            .await
            .map_err(Error::Command)?;
        self.delay.delay_us(RESET_TIME_US).await;
        Ok(())
    }

    /// Read user register 1.
    pub async fn read_user_register(&mut self) -> Result<UserRegister, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.bus
            .read_register(self.address, Command::ReadUserRegister1.code(), &mut buf)
            .await
            .map_err(Error::Bus)?;
        Ok(UserRegister::from_byte(buf[0]))
    }

    /// Read the heater control register.
    pub async fn read_heater_register(&mut self) -> Result<HeaterLevel, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.bus
            .read_register(self.address, Command::ReadHeaterRegister.code(), &mut buf)
            .await
            .map_err(Error::Bus)?;
        Ok(HeaterLevel::from_byte(buf[0]))
    }

    fn check_cancelled(&self) -> Result<(), Error<I2C::Error>> {
        if self.cancel.is_cancelled() {
            debug!("si7021 {:#04x}: read cancelled", self.address);
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn sample(&mut self, quantity: Quantity) -> Result<[u8; 2], Error<I2C::Error>> {
        self.check_cancelled()?;
        let command = quantity.command(self.mode);
        debug!("si7021 {:#04x}: measuring with {command:?}", self.address);

        let mut buf = [0u8; 2];
        if self.mode == MeasurementMode::Hold {
            self.bus
                .read_register(self.address, command.code(), &mut buf)
                .await
                .map_err(Error::Bus)?;
            return Ok(buf);
        }

        self.bus
            .write_command(self.address, &[command.code()])
            .await
            .map_err(|e| {
                warn!("si7021 {:#04x}: could not write {command:?}", self.address);
                Error::Command(e)
            })?;

        for attempt in 1..=self.retry.attempts {
            self.delay.delay_us(self.retry.interval_us()).await;
            self.check_cancelled()?;
            match self.bus.read(self.address, &mut buf).await {
                Ok(()) => return Ok(buf),
                Err(e) if is_busy(e.kind()) => {
                    trace!("si7021 {:#04x}: not ready (attempt {attempt})", self.address);
                }
                Err(e) => {
                    warn!("si7021 {:#04x}: read failed: {e:?}", self.address);
                    return Err(Error::Bus(e));
                }
            }
        }
        warn!(
            "si7021 {:#04x}: no result after {} attempts",
            self.address, self.retry.attempts
        );
        Err(Error::ConversionTimeout)
    }
}

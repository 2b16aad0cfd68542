use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c, SevenBitAddress};
use log::{debug, trace, warn};

use crate::bus::Bus;
use crate::commands::{Command, MeasurementMode, Quantity};
use crate::conversion::{Decikelvin, Measurement, RawHumidity, RawTemperature, RelativeHumidity};
use crate::error::Error;
use crate::registers::{HeaterLevel, UserRegister};
use crate::retry::{CancelToken, RetryPolicy, is_busy};

/// I2C address of the Si7021. It is fixed in the part.
pub const DEFAULT_ADDRESS: SevenBitAddress = 0x40;

/// Time the sensor needs after a soft reset before it will respond (section 3.1).
pub(crate) const RESET_TIME_US: u32 = 15_000;

/// Driver for the Si7021 temperature and humidity sensor.
///
/// # Quick start
///
/// Create the driver with any transport implementing the blocking
/// [`I2c`](embedded_hal::i2c::I2c) trait and a [`DelayNs`] provider, then call
/// [`Si7021::read_temperature`] or [`Si7021::read_relative_humidity`].
///
/// Every read is a fresh, self-contained exchange with the sensor: a command is
/// written, the driver waits for the conversion, the two result bytes are read and
/// converted. A failed read leaves nothing behind that could affect the next one.
///
/// # Measurement modes
///
/// By default the driver uses the no-hold commands. The sensor releases the bus
/// while it converts and refuses to acknowledge reads until the result is ready,
/// so the driver polls according to its [`RetryPolicy`]. With
/// [`MeasurementMode::Hold`] the command and the read are one transaction and the
/// sensor stretches the clock instead, which needs a controller that supports it.
///
/// # Sharing
///
/// Reads take `&mut self`, so a single driver never has two transactions in flight.
/// To poll it from several threads, use [`Device`](crate::Device), which serialises
/// whole reads.
#[derive(Debug)]
pub struct Si7021<I2C, D> {
    bus: Bus<I2C>,
    delay: D,
    address: SevenBitAddress,
    mode: MeasurementMode,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl<I2C, D> Si7021<I2C, D>
where
    I2C: I2c<SevenBitAddress>,
    D: DelayNs,
{
    ////////////////////////////////////////////////////////////////////////////////
    // Construction and configuration
    ////////////////////////////////////////////////////////////////////////////////

    /// Create a driver for a sensor at the default address, using no-hold
    /// measurements and the default retry policy.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            bus: Bus::new(i2c),
            delay,
            address: DEFAULT_ADDRESS,
            mode: MeasurementMode::default(),
            retry: RetryPolicy::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Talk to the sensor at a different address, for example behind an address
    /// translator.
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

    /// Address the driver talks to.
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Current measurement mode.
    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    /// Current retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Give back the transport and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.bus.release(), self.delay)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Measurements
    ////////////////////////////////////////////////////////////////////////////////

    /// Measure the relative humidity.
    ///
    /// The result is clamped to 0–100 %.
    ///
    /// # Errors
    ///
    /// - [`Error::Command`] if the measurement command could not be written.
    /// - [`Error::ConversionTimeout`] if the sensor did not produce a result
    ///   within the retry policy.
    /// - [`Error::Bus`] for any other transport failure.
    /// - [`Error::Cancelled`] if the cancel token was tripped.
    pub fn read_relative_humidity(&mut self) -> Result<RelativeHumidity, Error<I2C::Error>> {
        let bytes = self.sample(Quantity::RelativeHumidity)?;
        Ok(RawHumidity::from_be_bytes(bytes).into())
    }

    /// Measure the temperature.
    ///
    /// Errors are the same as for [`Si7021::read_relative_humidity`].
    pub fn read_temperature(&mut self) -> Result<Decikelvin, Error<I2C::Error>> {
        let bytes = self.sample(Quantity::Temperature)?;
        Ok(RawTemperature::from_be_bytes(bytes).into())
    }

    /// Read the temperature measured during the last humidity conversion.
    ///
    /// No conversion is started. If there has been no humidity measurement since
    /// power-on the sensor returns whatever is in its result register.
    pub fn read_previous_temperature(&mut self) -> Result<Decikelvin, Error<I2C::Error>> {
        self.check_cancelled()?;
        let mut buf = [0u8; 2];
        self.bus
            .read_register(
                self.address,
                Command::ReadPreviousTemperature.code(),
                &mut buf,
            )
            .map_err(Error::Bus)?;
        Ok(RawTemperature::from_be_bytes(buf).into())
    }

    /// Measure humidity, then read back the temperature taken during that same
    /// conversion.
    ///
    /// This is quicker than two separate measurements and the two values belong
    /// together.
    pub fn measure(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let relative_humidity = self.read_relative_humidity()?;
        let temperature = self.read_previous_temperature()?;
        Ok(Measurement {
            relative_humidity,
            temperature,
        })
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Housekeeping
    ////////////////////////////////////////////////////////////////////////////////

    /// Soft-reset the sensor and wait for it to come back.
    ///
    /// The user and heater registers return to their defaults.
    pub fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("si7021 {:#04x}: soft reset", self.address);
        self.bus
            .write_command(self.address, &[Command::Reset.code()])
            .map_err(Error::Command)?;
        self.delay.delay_us(RESET_TIME_US);
        Ok(())
    }

    /// Read user register 1.
    pub fn read_user_register(&mut self) -> Result<UserRegister, Error<I2C::Error>> {
        self.read_register_byte(Command::ReadUserRegister1)
            .map(UserRegister::from_byte)
    }

    /// Read the heater control register.
    pub fn read_heater_register(&mut self) -> Result<HeaterLevel, Error<I2C::Error>> {
        self.read_register_byte(Command::ReadHeaterRegister)
            .map(HeaterLevel::from_byte)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Internals
    ////////////////////////////////////////////////////////////////////////////////

    fn read_register_byte(&mut self, command: Command) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.bus
            .read_register(self.address, command.code(), &mut buf)
            .map_err(Error::Bus)?;
        trace!("si7021 {:#04x}: {command:?} = {:#04x}", self.address, buf[0]);
        Ok(buf[0])
    }

    fn check_cancelled(&self) -> Result<(), Error<I2C::Error>> {
        if self.cancel.is_cancelled() {
            debug!("si7021 {:#04x}: read cancelled", self.address);
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run one measurement and return the two result bytes.
    fn sample(&mut self, quantity: Quantity) -> Result<[u8; 2], Error<I2C::Error>> {
        self.check_cancelled()?;
        let command = quantity.command(self.mode);
        debug!("si7021 {:#04x}: measuring with {command:?}", self.address);

        match self.mode {
            MeasurementMode::Hold => {
                let mut buf = [0u8; 2];
                self.bus
                    .read_register(self.address, command.code(), &mut buf)
                    .map_err(Error::Bus)?;
                Ok(buf)
            }
            MeasurementMode::NoHold => {
                self.bus
                    .write_command(self.address, &[command.code()])
                    .map_err(|e| {
                        warn!("si7021 {:#04x}: could not write {command:?}", self.address);
                        Error::Command(e)
                    })?;
                self.poll_result()
            }
        }
    }

    /// Poll for the result of a no-hold conversion.
    fn poll_result(&mut self) -> Result<[u8; 2], Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        for attempt in 1..=self.retry.attempts {
            self.delay.delay_us(self.retry.interval_us());
            self.check_cancelled()?;
            match self.bus.read(self.address, &mut buf) {
                Ok(()) => {
                    trace!(
                        "si7021 {:#04x}: result {buf:02x?} after {attempt} attempt(s)",
                        self.address
                    );
                    return Ok(buf);
                }
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

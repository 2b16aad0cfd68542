//! Host-facing ownership of a sensor: lifecycle and polled values.
//!
//! A [`Device`] is created once the sensor has been found on the bus. The host
//! starts it, polls its named values for as long as it is attached, and stops it on
//! removal. Each poll performs a fresh read; nothing is cached.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c, SevenBitAddress};
use log::{debug, info, warn};

use crate::conversion::{Decikelvin, RelativeHumidity};
use crate::driver::Si7021;
use crate::error::Error;
use crate::registers::UserRegister;
use crate::retry::CancelToken;

/// Name of the exported temperature value, in tenths of a kelvin.
pub const TEMPERATURE: &str = "temperature";
/// Name of the exported relative humidity value, in percent.
pub const HUMIDITY: &str = "humidity";
/// Names of all the values a [`Device`] exports.
pub const NAMES: [&str; 2] = [TEMPERATURE, HUMIDITY];

/// Problems with a [`Device`].
#[derive(Debug, thiserror::Error)]
pub enum DeviceError<E: core::fmt::Debug> {
    /// Nothing acknowledged the sensor's address.
    #[error("no sensor responded at address {0:#04x}")]
    NotFound(SevenBitAddress),
    /// The device has not been started, or has been stopped.
    #[error("device is not started")]
    NotStarted,
    /// The requested value is not one that the device exports.
    #[error("unknown value {0:?}")]
    UnknownValue(String),
    /// Reading from the sensor failed.
    #[error(transparent)]
    Sensor(#[from] Error<E>),
}

/// A started-or-stopped sensor that can be polled from several threads.
///
/// Each read holds the driver's lock for exactly one exchange with the sensor
/// (command, wait, result), so concurrent polls of temperature and humidity are
/// serialised rather than interleaved on the bus. [`Device::stop`] does not need
/// the lock: it trips the cancel token so a read stuck polling gives up quickly.
#[derive(Debug)]
pub struct Device<I2C, D> {
    sensor: Mutex<Si7021<I2C, D>>,
    cancel: CancelToken,
    started: AtomicBool,
}

impl<I2C, D> Device<I2C, D>
where
    I2C: I2c<SevenBitAddress>,
    D: DelayNs,
{
    /// Check that a sensor answers at the driver's address and take ownership of it.
    ///
    /// Detection reads user register 1, which needs no conversion. The device is
    /// returned stopped.
    pub fn probe(mut sensor: Si7021<I2C, D>) -> Result<Self, DeviceError<I2C::Error>> {
        let address = sensor.address();
        match sensor.read_user_register() {
            Ok(register) => {
                info!(
                    "si7021 {address:#04x}: found, resolution {:?}",
                    register.resolution
                );
                Ok(Self::new(sensor))
            }
            Err(Error::Bus(e)) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {
                Err(DeviceError::NotFound(address))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Take ownership of a driver without checking for the sensor.
    pub fn new(sensor: Si7021<I2C, D>) -> Self {
        let cancel = sensor.cancel_token();
        Self {
            sensor: Mutex::new(sensor),
            cancel,
            started: AtomicBool::new(false),
        }
    }

    /// Reset the sensor and begin serving reads.
    ///
    /// Calling this on a started device resets the sensor again. If that fails the
    /// device is left stopped.
    pub fn start(&self) -> Result<UserRegister, DeviceError<I2C::Error>> {
        self.started.store(false, Ordering::Release);
        self.cancel.reset();
        let mut sensor = self.lock();
        sensor.reset()?;
        let register = sensor.read_user_register()?;
        if register.vdd_low {
            warn!("si7021 {:#04x}: supply voltage is low", sensor.address());
        }
        self.started.store(true, Ordering::Release);
        debug!("si7021 {:#04x}: started", sensor.address());
        Ok(register)
    }

    /// Stop serving reads.
    ///
    /// A read in progress is abandoned at its next poll attempt and fails with
    /// [`Error::Cancelled`].
    pub fn stop(&self) {
        self.started.store(false, Ordering::Release);
        self.cancel.cancel();
        debug!("si7021: stopped");
    }

    /// Returns true between [`Device::start`] and [`Device::stop`].
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Names accepted by [`Device::value`].
    pub fn names(&self) -> &'static [&'static str] {
        &NAMES
    }

    /// Current temperature.
    pub fn temperature(&self) -> Result<Decikelvin, DeviceError<I2C::Error>> {
        self.ensure_started()?;
        Ok(self.lock().read_temperature()?)
    }

    /// Current relative humidity.
    pub fn humidity(&self) -> Result<RelativeHumidity, DeviceError<I2C::Error>> {
        self.ensure_started()?;
        Ok(self.lock().read_relative_humidity()?)
    }

    /// Read an exported value by name.
    ///
    /// `"temperature"` is in tenths of a kelvin and `"humidity"` in percent.
    pub fn value(&self, name: &str) -> Result<i32, DeviceError<I2C::Error>> {
        match name {
            TEMPERATURE => self.temperature().map(Decikelvin::value),
            HUMIDITY => self.humidity().map(|rh| i32::from(rh.percent())),
            other => Err(DeviceError::UnknownValue(other.to_owned())),
        }
    }

    /// Stop the device and give back the driver.
    pub fn release(self) -> Si7021<I2C, D> {
        self.stop();
        self.sensor
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_started(&self) -> Result<(), DeviceError<I2C::Error>> {
        if self.is_started() {
            Ok(())
        } else {
            Err(DeviceError::NotStarted)
        }
    }

    /// Lock the driver for one read.
    ///
    /// A panic in another thread cannot leave the driver mid-transaction (every read
    /// starts from scratch), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Si7021<I2C, D>> {
        self.sensor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

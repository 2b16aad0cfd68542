//! Command set of the Si7021.
//!
//! Every transaction with the sensor starts by writing one of these command codes.
//! See section 5 and table 11 of the Si7021-A20 datasheet.

/// Command codes understood by the Si7021.
///
/// The write commands are listed so the set is complete, but this crate never
/// issues them: the driver only reads from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Measure relative humidity, holding the bus (clock stretching) until the
    /// conversion completes.
    ///
    /// A humidity conversion also performs a temperature conversion, which can be
    /// read back afterwards with [`Command::ReadPreviousTemperature`].
    MeasureHumidityHold,
    /// Measure relative humidity, releasing the bus during the conversion.
    ///
    /// The sensor will not acknowledge a read until the result is ready, so the
    /// controller has to poll.
    MeasureHumidityNoHold,
    /// Measure temperature, holding the bus until the conversion completes.
    MeasureTemperatureHold,
    /// Measure temperature, releasing the bus during the conversion.
    MeasureTemperatureNoHold,
    /// Read the temperature measured during the previous humidity conversion.
    ///
    /// No new conversion is started, so the result is available immediately.
    ReadPreviousTemperature,
    /// Soft reset.
    ///
    /// The sensor takes up to 15 ms to come back afterwards (section 3.1).
    Reset,
    /// Write user register 1 (resolution and heater enable).
    WriteUserRegister1,
    /// Read user register 1.
    ReadUserRegister1,
    /// Write the heater control register.
    WriteHeaterRegister,
    /// Read the heater control register.
    ReadHeaterRegister,
}

impl Command {
    /// Byte written on the bus for this command.
    pub const fn code(self) -> u8 {
        match self {
            Command::MeasureHumidityHold => 0xE5,
            Command::MeasureHumidityNoHold => 0xF5,
            Command::MeasureTemperatureHold => 0xE3,
            Command::MeasureTemperatureNoHold => 0xF3,
            Command::ReadPreviousTemperature => 0xE0,
            Command::Reset => 0xFE,
            Command::WriteUserRegister1 => 0xE6,
            Command::ReadUserRegister1 => 0xE7,
            Command::WriteHeaterRegister => 0x51,
            Command::ReadHeaterRegister => 0x11,
        }
    }

    /// Returns true if the command starts a new conversion.
    pub const fn starts_conversion(self) -> bool {
        matches!(
            self,
            Command::MeasureHumidityHold
                | Command::MeasureHumidityNoHold
                | Command::MeasureTemperatureHold
                | Command::MeasureTemperatureNoHold
        )
    }

    /// Returns true if the command changes the sensor's configuration.
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Command::WriteUserRegister1 | Command::WriteHeaterRegister
        )
    }
}

impl From<Command> for u8 {
    fn from(value: Command) -> u8 {
        value.code()
    }
}

/// Which of the two physical quantities a measurement command produces.
///
/// The engine picks both the command and the conversion from this one value, so a
/// raw humidity sample cannot be converted with the temperature formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantity {
    RelativeHumidity,
    Temperature,
}

/// Whether the sensor holds the bus during a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MeasurementMode {
    /// Issue the command, release the bus and poll for the result.
    ///
    /// This is the default, as it works with controllers that don't support clock
    /// stretching and leaves the bus free for other targets during the conversion.
    #[default]
    NoHold,
    /// Issue the command and read the result in the same transaction. The sensor
    /// stretches the clock until the conversion is done.
    Hold,
}

impl Quantity {
    pub(crate) const fn command(self, mode: MeasurementMode) -> Command {
        match (self, mode) {
            (Quantity::RelativeHumidity, MeasurementMode::Hold) => Command::MeasureHumidityHold,
            (Quantity::RelativeHumidity, MeasurementMode::NoHold) => {
                Command::MeasureHumidityNoHold
            }
            (Quantity::Temperature, MeasurementMode::Hold) => Command::MeasureTemperatureHold,
            (Quantity::Temperature, MeasurementMode::NoHold) => Command::MeasureTemperatureNoHold,
        }
    }
}

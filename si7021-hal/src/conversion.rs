//! Conversion of raw sensor output into physical units.
//!
//! Both quantities come off the bus as a big-endian 16-bit code and are turned into
//! units with the linear formulas from section 5.1 of the datasheet. Integer
//! arithmetic is used throughout, so the results are exact and repeatable.

use core::fmt;

/// 0 °C in tenths of a kelvin, truncated the way monitoring hosts expect it.
const ZERO_CELSIUS_DECIKELVIN: i32 = 2_731;

/// Raw relative humidity code read after a humidity measurement command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHumidity(pub u16);

/// Raw temperature code read after a temperature measurement command, or read back
/// from the previous humidity conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTemperature(pub u16);

impl RawHumidity {
    /// Assemble the code from the two bytes as transmitted (MSB first).
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// Percent relative humidity before clamping.
    ///
    /// At the extremes of the sensor's range this falls slightly outside 0–100
    /// (from −6 up to 118).
    pub fn percent_unclamped(self) -> i32 {
        (i32::from(self.0) * 125) / 65_536 - 6
    }
}

impl RawTemperature {
    /// Assemble the code from the two bytes as transmitted (MSB first).
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// Temperature in hundredths of a degree Celsius.
    pub fn centi_celsius(self) -> i32 {
        (i32::from(self.0) * 17_572) / 65_536 - 4_685
    }
}

/// Relative humidity in whole percent, always in the range 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelativeHumidity(u8);

impl RelativeHumidity {
    /// Largest value the sensor reports.
    pub const MAX: RelativeHumidity = RelativeHumidity(100);

    /// Clamp a percentage into the valid range.
    ///
    /// Readings outside 0–100 are borderline readings at the physical limits of the
    /// sensor, not errors.
    pub fn saturating_from_percent(percent: i32) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    /// Whole percent relative humidity.
    pub fn percent(self) -> u8 {
        self.0
    }
}

impl From<RawHumidity> for RelativeHumidity {
    fn from(raw: RawHumidity) -> Self {
        Self::saturating_from_percent(raw.percent_unclamped())
    }
}

impl fmt::Display for RelativeHumidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Temperature in tenths of a kelvin.
///
/// This keeps exported values as non-negative integers with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decikelvin(i32);

impl Decikelvin {
    /// Wrap a value already in tenths of a kelvin.
    pub const fn new(decikelvin: i32) -> Self {
        Self(decikelvin)
    }

    /// Convert from hundredths of a degree Celsius.
    ///
    /// The Celsius value is rounded to the nearest tenth (halves away from zero)
    /// before the 273.1 K offset is added.
    pub fn from_centi_celsius(centi_celsius: i32) -> Self {
        Self(round_half_away(centi_celsius, 10) + ZERO_CELSIUS_DECIKELVIN)
    }

    /// Tenths of a kelvin.
    pub fn value(self) -> i32 {
        self.0
    }

    /// Tenths of a degree Celsius.
    pub fn deci_celsius(self) -> i32 {
        self.0 - ZERO_CELSIUS_DECIKELVIN
    }
}

impl From<RawTemperature> for Decikelvin {
    fn from(raw: RawTemperature) -> Self {
        Self::from_centi_celsius(raw.centi_celsius())
    }
}

impl fmt::Display for Decikelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}K", abs / 10, abs % 10)
    }
}

/// Divide, rounding halves away from zero.
fn round_half_away(value: i32, divisor: i32) -> i32 {
    let half = divisor / 2;
    if value < 0 {
        (value - half) / divisor
    } else {
        (value + half) / divisor
    }
}

/// Humidity and temperature taken during the same conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Relative humidity.
    pub relative_humidity: RelativeHumidity,
    /// Temperature measured by the sensor as part of the humidity conversion.
    pub temperature: Decikelvin,
}

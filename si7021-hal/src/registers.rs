//! Read-only views of the Si7021 configuration registers.
//!
//! The driver never writes these registers, but reading them is useful to check
//! which resolution the sensor is converting at and whether its supply is low.

use bit_field::BitField;

/// Measurement resolution, selected by bits 7 and 0 of user register 1.
///
/// See table 14 in section 6 of the datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 12-bit humidity, 14-bit temperature (power-on default).
    Rh12T14,
    /// 8-bit humidity, 12-bit temperature.
    Rh8T12,
    /// 10-bit humidity, 13-bit temperature.
    Rh10T13,
    /// 11-bit humidity, 11-bit temperature.
    Rh11T11,
}

impl Resolution {
    /// Worst-case time for a humidity conversion at this resolution, including the
    /// temperature conversion that comes with it (table 2).
    pub fn humidity_conversion_time_us(self) -> u32 {
        match self {
            Resolution::Rh12T14 => 12_000 + 10_800,
            Resolution::Rh8T12 => 3_100 + 3_800,
            Resolution::Rh10T13 => 4_500 + 6_200,
            Resolution::Rh11T11 => 7_000 + 2_400,
        }
    }

    /// Worst-case time for a temperature conversion at this resolution.
    pub fn temperature_conversion_time_us(self) -> u32 {
        match self {
            Resolution::Rh12T14 => 10_800,
            Resolution::Rh8T12 => 3_800,
            Resolution::Rh10T13 => 6_200,
            Resolution::Rh11T11 => 2_400,
        }
    }
}

/// Contents of user register 1.
///
/// | bit | field |
/// |-----|-------|
/// | 7   | RES1  |
/// | 6   | VDDS (1 = supply low) |
/// | 5:3 | reserved |
/// | 2   | HTRE (heater enabled) |
/// | 1   | reserved |
/// | 0   | RES0  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRegister {
    /// Measurement resolution.
    pub resolution: Resolution,
    /// The supply voltage has dropped below the level where the sensor is
    /// guaranteed to work (roughly 1.9 V).
    pub vdd_low: bool,
    /// The on-chip heater is switched on.
    ///
    /// Readings taken with the heater on will show a raised temperature and a
    /// lowered humidity.
    pub heater_enabled: bool,
    /// Register value as read.
    pub raw: u8,
}

impl UserRegister {
    /// Value of the register after power-on or reset.
    pub const RESET_VALUE: u8 = 0x3A;

    pub(crate) fn from_byte(byte: u8) -> Self {
        let resolution = match (byte.get_bit(7), byte.get_bit(0)) {
            (false, false) => Resolution::Rh12T14,
            (false, true) => Resolution::Rh8T12,
            (true, false) => Resolution::Rh10T13,
            (true, true) => Resolution::Rh11T11,
        };
        Self {
            resolution,
            vdd_low: byte.get_bit(6),
            heater_enabled: byte.get_bit(2),
            raw: byte,
        }
    }
}

/// Heater current setting from the heater control register (bits 3:0).
///
/// The heater is only powered when [`UserRegister::heater_enabled`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaterLevel(u8);

impl HeaterLevel {
    pub(crate) fn from_byte(byte: u8) -> Self {
        Self(byte.get_bits(0..4))
    }

    /// Heater setting, 0 through 15.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Typical heater current at 3.3 V in microamps (table 15).
    ///
    /// The current rises in steps of roughly 6.07 mA from 3.09 mA at level 0 to
    /// 94.2 mA at level 15.
    pub fn typical_current_ua(self) -> u32 {
        3_090 + u32::from(self.0) * 6_074
    }
}

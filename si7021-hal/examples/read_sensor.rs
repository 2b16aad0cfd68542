//! Read temperature and humidity from an Si7021 attached to a Linux I2C bus.
//!
//! The Si7021 is a temperature and humidity sensor made by Silicon Labs. Most
//! breakout boards wire it to address 0x40 and the example assumes that.
//!
//! Run it with the path of the bus device, for example:
//!
//! ```text
//! cargo run --example read_sensor -- /dev/i2c-1
//! ```
//!
//! You may wish to read this example alongside section 5 of the [Si7021
//! datasheet][datasheet].
//!
//! [datasheet]: https://www.silabs.com/documents/public/data-sheets/Si7021-A20.pdf
use linux_embedded_hal::{Delay, I2cdev};
use si7021_hal::{MeasurementMode, Si7021};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("/dev/i2c-1"));
    let i2c = I2cdev::new(&path)?;

    // No-hold mode is the default: the driver starts a conversion, lets go of the
    // bus, then polls until the sensor stops NACKing its address.
    let mut sensor = Si7021::new(i2c, Delay);

    // Reading user register 1 needs no conversion, so it's a quick way to check that
    // something is there.
    let register = sensor.read_user_register()?;
    println!("User register: {register:?}");

    // A humidity conversion also measures temperature. `measure` fetches that
    // temperature afterwards instead of starting a second conversion.
    let measurement = sensor.measure()?;
    println!(
        "{}    {:.1}°C    {} humidity",
        measurement.temperature,
        f64::from(measurement.temperature.deci_celsius()) / 10.0,
        measurement.relative_humidity,
    );

    // Hold mode keeps the transaction open while the sensor converts, stretching
    // the clock. Not every bus master copes with that, which is why it isn't the
    // default.
    let (i2c, delay) = sensor.release();
    let mut sensor = Si7021::new(i2c, delay).with_mode(MeasurementMode::Hold);
    println!("Hold mode: {}", sensor.read_temperature()?);

    Ok(())
}

use anyhow::Context;

use crate::Sensor;

pub(crate) fn measure(sensor: &mut Sensor) -> anyhow::Result<()> {
    let measurement = sensor.measure().context("measurement failed")?;
    println!(
        "temperature: {}  humidity: {}",
        measurement.temperature, measurement.relative_humidity
    );
    Ok(())
}

pub(crate) fn registers(sensor: &mut Sensor) -> anyhow::Result<()> {
    let user = sensor
        .read_user_register()
        .context("could not read user register 1")?;
    let heater = sensor
        .read_heater_register()
        .context("could not read heater register")?;
    println!("User register 1: {:#04x}", user.raw);
    println!("  resolution:     {:?}", user.resolution);
    println!("  supply low:     {}", user.vdd_low);
    println!("  heater enabled: {}", user.heater_enabled);
    println!(
        "Heater level:    {} (about {} uA when enabled)",
        heater.level(),
        heater.typical_current_ua()
    );
    Ok(())
}

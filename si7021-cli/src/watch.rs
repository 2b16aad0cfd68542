use std::time::Duration;

use log::warn;

use crate::Monitor;

/// Print every exported value once per period until `count` polls have been made.
///
/// A value that can't be read is shown as `-` and the loop carries on.
pub(crate) fn action(device: &Monitor, period: Duration, count: Option<u64>) {
    let mut polls = 0;
    while count.is_none_or(|count| polls < count) {
        if polls > 0 {
            std::thread::sleep(period);
        }
        let readings: Vec<_> = device
            .names()
            .iter()
            .map(|&name| match device.value(name) {
                Ok(value) => (name, Some(value)),
                Err(e) => {
                    warn!("could not read {name}: {e}");
                    (name, None)
                }
            })
            .collect();
        println!("{}", format_line(&readings));
        polls += 1;
    }
}

fn format_line(readings: &[(&str, Option<i32>)]) -> String {
    readings
        .iter()
        .map(|(name, value)| match value {
            Some(value) => format!("{name}={value}"),
            None => format!("{name}=-"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

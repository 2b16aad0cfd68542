//! Lifecycle and concurrent polling of a [`Device`] over a simulated sensor.
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal_mock::eh1::delay::NoopDelay;
use si7021_hal::device::{HUMIDITY, NAMES, TEMPERATURE};
use si7021_hal::{Device, DeviceError, Error, RetryPolicy, Si7021};

mod common;
use common::{Event, FakeSensor, SleepDelay, assert_not_interleaved};

fn started(bus: &FakeSensor) -> Device<FakeSensor, NoopDelay> {
    let device = Device::probe(Si7021::new(bus.clone(), NoopDelay::new())).unwrap();
    device.start().unwrap();
    device
}

#[test]
fn probe_finds_sensor() {
    let bus = FakeSensor::new();
    let device = Device::probe(Si7021::new(bus.clone(), NoopDelay::new())).unwrap();
    assert!(!device.is_started());
    assert_eq!(bus.log(), [Event::Command(0xE7), Event::Data(0xE7)]);
}

#[test]
fn probe_reports_missing_sensor() {
    let bus = FakeSensor::new().absent();
    let result = Device::probe(Si7021::new(bus, NoopDelay::new()));
    assert!(matches!(result, Err(DeviceError::NotFound(0x40))));

    let result = Device::probe(Si7021::new(FakeSensor::new(), NoopDelay::new()).with_address(0x41));
    assert!(matches!(result, Err(DeviceError::NotFound(0x41))));
}

#[test]
fn values_need_start() {
    let bus = FakeSensor::new();
    let device = Device::new(Si7021::new(bus.clone(), NoopDelay::new()));
    assert!(matches!(
        device.value(TEMPERATURE),
        Err(DeviceError::NotStarted)
    ));
    assert!(matches!(device.humidity(), Err(DeviceError::NotStarted)));
    assert!(bus.log().is_empty());
}

#[test]
fn start_resets_sensor() {
    let bus = FakeSensor::new();
    bus.state.lock().unwrap().user_register = 0x00;
    let device = Device::new(Si7021::new(bus.clone(), NoopDelay::new()));

    let register = device.start().unwrap();
    assert!(device.is_started());
    assert_eq!(register.raw, 0x3A);
    assert_eq!(
        bus.log(),
        [Event::Command(0xFE), Event::Command(0xE7), Event::Data(0xE7)]
    );
}

#[test]
fn values_by_name() {
    let bus = FakeSensor::new().with_busy_polls(2);
    let device = started(&bus);

    assert_eq!(device.value(TEMPERATURE).unwrap(), 2_963);
    assert_eq!(device.value(HUMIDITY).unwrap(), 56);
    assert_eq!(device.names(), NAMES);
    assert_eq!(device.names(), [TEMPERATURE, HUMIDITY]);
    for name in device.names() {
        assert!(device.value(name).is_ok(), "{name}");
    }
    assert!(matches!(
        device.value("pressure"),
        Err(DeviceError::UnknownValue(name)) if name == "pressure"
    ));
}

#[test]
fn every_poll_reads_the_sensor() {
    let bus = FakeSensor::new();
    let device = started(&bus);

    assert_eq!(device.humidity().unwrap().percent(), 56);
    bus.state.lock().unwrap().humidity = [0xFF, 0xFF];
    assert_eq!(device.humidity().unwrap().percent(), 100);
}

#[test]
fn stop_and_restart() {
    let bus = FakeSensor::new();
    let device = started(&bus);
    assert!(device.temperature().is_ok());

    device.stop();
    assert!(!device.is_started());
    assert!(matches!(device.temperature(), Err(DeviceError::NotStarted)));

    device.start().unwrap();
    assert_eq!(device.temperature().unwrap().value(), 2_963);
}

#[test]
fn failed_restart_leaves_device_stopped() {
    let bus = FakeSensor::new();
    let device = started(&bus);
    assert!(device.is_started());

    bus.state.lock().unwrap().present = false;
    assert!(matches!(
        device.start(),
        Err(DeviceError::Sensor(Error::Command(_)))
    ));
    assert!(!device.is_started());
    assert!(matches!(device.temperature(), Err(DeviceError::NotStarted)));
}

#[test]
fn sensor_errors_are_reported() {
    let bus = FakeSensor::new().with_busy_polls(50);
    let sensor = Si7021::new(bus.clone(), NoopDelay::new())
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)));
    let device = Device::new(sensor);
    device.start().unwrap();

    assert!(matches!(
        device.humidity(),
        Err(DeviceError::Sensor(Error::ConversionTimeout))
    ));
}

#[test]
fn concurrent_reads_are_serialised() {
    let bus = FakeSensor::new()
        .with_latency(Duration::from_micros(200))
        .with_busy_polls(2);
    let device = Arc::new(started(&bus));

    let handles: Vec<_> = [TEMPERATURE, HUMIDITY, TEMPERATURE, HUMIDITY]
        .into_iter()
        .map(|name| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                (0..10)
                    .map(|_| device.value(name).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results[0].iter().chain(&results[2]).all(|&v| v == 2_963));
    assert!(results[1].iter().chain(&results[3]).all(|&v| v == 56));

    let log = bus.log();
    assert_not_interleaved(&log);
    let reads = log
        .iter()
        .filter(|e| matches!(e, Event::Command(0xF3 | 0xF5)))
        .count();
    assert_eq!(reads, 40);
}

#[test]
fn stop_cancels_read_in_progress() {
    let bus = FakeSensor::new().with_busy_polls(u32::MAX);
    let sensor = Si7021::new(bus.clone(), SleepDelay)
        .with_retry_policy(RetryPolicy::new(255, Duration::from_millis(10)));
    let device = Arc::new(Device::new(sensor));
    device.start().unwrap();

    let started_at = Instant::now();
    let reader = {
        let device = Arc::clone(&device);
        thread::spawn(move || device.temperature())
    };
    thread::sleep(Duration::from_millis(50));
    device.stop();

    let result = reader.join().unwrap();
    assert!(matches!(
        result,
        Err(DeviceError::Sensor(Error::Cancelled))
    ));
    assert!(started_at.elapsed() < Duration::from_secs(1));
}

#[test]
fn release_returns_driver() {
    let bus = FakeSensor::new();
    let device = started(&bus);
    let mut sensor = device.release();

    assert!(sensor.cancel_token().is_cancelled());
    sensor.cancel_token().reset();
    assert_eq!(sensor.read_temperature().unwrap().value(), 2_963);
}

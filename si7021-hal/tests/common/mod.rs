//! Simulated Si7021 on an I2C bus, for tests that need more than a fixed list of
//! expected transactions.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use si7021_hal::CancelToken;

pub const ADDRESS: u8 = 0x40;

/// Something that happened on the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A command byte was written.
    Command(u8),
    /// A read was refused because a conversion was still running.
    Busy,
    /// A read returned the result of the given command.
    Data(u8),
}

#[derive(Debug)]
pub struct SensorState {
    pub present: bool,
    /// Reads refused after each no-hold measurement command.
    pub busy_polls: u32,
    pub humidity: [u8; 2],
    pub temperature: [u8; 2],
    pub user_register: u8,
    pub heater_register: u8,
    pub log: Vec<Event>,
    last_command: Option<u8>,
    busy_remaining: u32,
}

/// Transport that behaves like an Si7021 at address 0x40.
///
/// Clones share the same simulated sensor. Each write and read sleeps for
/// `latency` before touching the sensor, so unsynchronised callers interleave.
#[derive(Debug, Clone)]
pub struct FakeSensor {
    pub state: Arc<Mutex<SensorState>>,
    pub latency: Duration,
}

impl FakeSensor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SensorState {
                present: true,
                busy_polls: 0,
                humidity: [0x80, 0x00],
                temperature: [0x66, 0x14],
                user_register: 0x3A,
                heater_register: 0x00,
                log: Vec::new(),
                last_command: None,
                busy_remaining: 0,
            })),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_busy_polls(self, polls: u32) -> Self {
        self.state.lock().unwrap().busy_polls = polls;
        self
    }

    pub fn absent(self) -> Self {
        self.state.lock().unwrap().present = false;
        self
    }

    pub fn log(&self) -> Vec<Event> {
        self.state.lock().unwrap().log.clone()
    }

    fn write_byte(&self, byte: u8) -> Result<(), ErrorKind> {
        std::thread::sleep(self.latency);
        let mut state = self.state.lock().unwrap();
        if !state.present {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        state.log.push(Event::Command(byte));
        state.busy_remaining = match byte {
            0xF5 | 0xF3 => state.busy_polls,
            _ => 0,
        };
        if byte == 0xFE {
            state.user_register = 0x3A;
            state.heater_register = 0x00;
            state.last_command = None;
        } else {
            state.last_command = Some(byte);
        }
        Ok(())
    }

    fn read_bytes(&self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        std::thread::sleep(self.latency);
        let mut state = self.state.lock().unwrap();
        let nack = Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        if !state.present {
            return nack;
        }
        if state.busy_remaining > 0 {
            state.busy_remaining -= 1;
            state.log.push(Event::Busy);
            return nack;
        }
        let Some(command) = state.last_command else {
            return nack;
        };
        let data: Vec<u8> = match command {
            0xF5 | 0xE5 => state.humidity.to_vec(),
            0xF3 | 0xE3 | 0xE0 => state.temperature.to_vec(),
            0xE7 => vec![state.user_register],
            0x11 => vec![state.heater_register],
            _ => return nack,
        };
        let len = buf.len().min(data.len());
        buf[..len].copy_from_slice(&data[..len]);
        state.log.push(Event::Data(command));
        Ok(())
    }
}

impl ErrorType for FakeSensor {
    type Error = ErrorKind;
}

impl I2c for FakeSensor {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    for byte in bytes.iter() {
                        self.write_byte(*byte)?;
                    }
                }
                Operation::Read(buf) => self.read_bytes(buf)?,
            }
        }
        Ok(())
    }
}

/// Delay that really sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Check that every measurement on the bus ran to completion before the next
/// command was written.
pub fn assert_not_interleaved(log: &[Event]) {
    let mut pending = None;
    for (i, event) in log.iter().enumerate() {
        match *event {
            Event::Command(0xFE) => assert_eq!(pending, None, "reset mid-read at {i}: {log:?}"),
            Event::Command(command) => {
                assert_eq!(pending, None, "interleaved command at {i}: {log:?}");
                pending = Some(command);
            }
            Event::Busy => assert!(pending.is_some(), "stray poll at {i}: {log:?}"),
            Event::Data(command) => {
                assert_eq!(pending, Some(command), "wrong result at {i}: {log:?}");
                pending = None;
            }
        }
    }
}

/// Delay that records how long it was asked to wait and can trip a cancel token.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub calls: usize,
    pub total_ns: u64,
    /// Cancel this token on the given call (1-based).
    pub cancel_on: Option<(usize, CancelToken)>,
}

impl RecordingDelay {
    pub fn cancelling(token: CancelToken, on_call: usize) -> Self {
        Self {
            cancel_on: Some((on_call, token)),
            ..Self::default()
        }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
        if let Some((on_call, token)) = &self.cancel_on {
            if self.calls == *on_call {
                token.cancel();
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms.saturating_mul(1_000_000));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(self, ns);
    }
}

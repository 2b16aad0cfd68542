#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "async")]
pub mod asynch;
pub mod bus;
pub mod commands;
pub mod conversion;
pub mod device;
mod driver;
mod error;
pub mod registers;
mod retry;

pub use commands::{Command, MeasurementMode};
pub use conversion::{Decikelvin, Measurement, RelativeHumidity};
pub use device::{Device, DeviceError};
pub use driver::{DEFAULT_ADDRESS, Si7021};
pub use error::Error;
pub use retry::{CancelToken, RetryPolicy};

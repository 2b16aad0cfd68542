//! Polling discipline for no-hold conversions.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embedded_hal::i2c::ErrorKind;

/// How long to keep polling the sensor for a conversion result.
///
/// The default of 20 attempts, 2 ms apart, waits at least 40 ms. That covers the
/// slowest conversion the sensor does (a 12-bit humidity conversion plus the 14-bit
/// temperature conversion that goes with it, about 23 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of reads attempted before giving up.
    pub attempts: u8,
    /// Delay before each read attempt.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(2),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given number of attempts and interval.
    ///
    /// With zero attempts a no-hold read writes the measurement command and then
    /// fails with [`Error::ConversionTimeout`] without reading anything. Hold-mode
    /// reads don't poll and are unaffected.
    ///
    /// [`Error::ConversionTimeout`]: crate::Error::ConversionTimeout
    pub fn new(attempts: u8, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Interval in microseconds, as taken by `DelayNs`.
    pub(crate) fn interval_us(&self) -> u32 {
        u32::try_from(self.interval.as_micros()).unwrap_or(u32::MAX)
    }

    /// Total time spent waiting if every attempt fails.
    pub fn total_wait_us(&self) -> u32 {
        self.interval_us().saturating_mul(u32::from(self.attempts))
    }
}

/// Returns true if a failed read means the sensor is still converting.
///
/// During a no-hold conversion the Si7021 does not acknowledge its address, so a
/// NACK is expected. Transports that can't tell a NACK apart report `Other`, which
/// is given the benefit of the doubt. Bus errors, arbitration loss and overruns
/// are real failures.
pub(crate) fn is_busy(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::NoAcknowledge(_) | ErrorKind::Other)
}

/// Shared flag used to abandon a read between poll attempts.
///
/// Clones share the same flag, so one can be handed to whatever needs to stop the
/// driver (for example when the device is being removed) while the driver holds
/// another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel reads using this token.
    ///
    /// Reads in progress fail with [`Error::Cancelled`] before their next attempt,
    /// and later reads fail straight away until [`CancelToken::reset`] is called.
    ///
    /// [`Error::Cancelled`]: crate::Error::Cancelled
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Allow reads again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Returns true if [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

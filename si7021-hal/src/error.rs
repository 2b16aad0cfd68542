use embedded_hal::i2c;

/// Problems when reading from the Si7021.
///
/// `E` is the error type of the underlying I2C transport.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: core::fmt::Debug> {
    /// An I2C transaction failed.
    ///
    /// The transport does not say whether the address or a data byte was not
    /// acknowledged, or whether the transfer timed out, so these all end up here.
    #[error("I2C transaction with the sensor failed: {0:?}")]
    Bus(E),
    /// The command that starts a measurement could not be written.
    ///
    /// This is a bus failure during the first phase of a read. No attempt is made to
    /// read a result after it.
    #[error("could not write command to the sensor: {0:?}")]
    Command(E),
    /// The sensor did not have a result ready within the retry budget.
    #[error("sensor did not finish the conversion in time")]
    ConversionTimeout,
    /// The read was abandoned through a [`CancelToken`](crate::CancelToken).
    #[error("read was cancelled")]
    Cancelled,
}

impl<E: i2c::Error> i2c::Error for Error<E> {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            Error::Bus(e) | Error::Command(e) => e.kind(),
            Error::ConversionTimeout | Error::Cancelled => i2c::ErrorKind::Other,
        }
    }
}

impl<E: core::fmt::Debug> Error<E> {
    /// Returns true if the error came straight from the I2C transport.
    pub fn is_bus_error(&self) -> bool {
        matches!(self, Error::Bus(_) | Error::Command(_))
    }
}

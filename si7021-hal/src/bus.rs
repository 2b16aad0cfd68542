//! Thin adapter over the I2C transport.
//!
//! Each method is exactly one I2C transaction. Nothing is retried here; deciding
//! what a failure means is left to the caller.
use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};

/// Request/response primitives the sensor engine is built on.
#[derive(Debug)]
pub struct Bus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c<SevenBitAddress>> Bus<I2C> {
    /// Wrap an I2C transport.
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Write `command` and read back enough bytes to fill `read_buffer`.
    ///
    /// The write and the read are issued as a single transaction (the read follows a
    /// repeated START), so no other transfer on the bus can come between them.
    pub fn read_register(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        read_buffer: &mut [u8],
    ) -> Result<(), I2C::Error> {
        self.i2c.transaction(
            address,
            &mut [Operation::Write(&[command]), Operation::Read(read_buffer)],
        )
    }

    /// Write `bytes` in a single transaction.
    pub fn write_command(&mut self, address: SevenBitAddress, bytes: &[u8]) -> Result<(), I2C::Error> {
        self.i2c.write(address, bytes)
    }

    /// Read enough bytes to fill `read_buffer`, without writing anything first.
    ///
    /// This is how the result of a no-hold conversion is collected. Writing the
    /// measurement command again would start a new conversion.
    pub fn read(&mut self, address: SevenBitAddress, read_buffer: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.read(address, read_buffer)
    }

    /// Give back the underlying transport.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

/// [`Bus`] over an async transport.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct AsyncBus<I2C> {
    i2c: I2C,
}

#[cfg(feature = "async")]
impl<I2C: embedded_hal_async::i2c::I2c<SevenBitAddress>> AsyncBus<I2C> {
    /// Wrap an async I2C transport.
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// See [`Bus::read_register`].
    pub async fn read_register(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        read_buffer: &mut [u8],
    ) -> Result<(), I2C::Error> {
        self.i2c
            .transaction(
                address,
                &mut [Operation::Write(&[command]), Operation::Read(read_buffer)],
            )
            .await
    }

    /// See [`Bus::write_command`].
    pub async fn write_command(
        &mut self,
        address: SevenBitAddress,
        bytes: &[u8],
    ) -> Result<(), I2C::Error> {
        self.i2c.write(address, bytes).await
    }

    /// See [`Bus::read`].
    pub async fn read(
        &mut self,
        address: SevenBitAddress,
        read_buffer: &mut [u8],
    ) -> Result<(), I2C::Error> {
        self.i2c.read(address, read_buffer).await
    }

    /// Give back the underlying transport.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

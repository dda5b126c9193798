//! Async I2C bus sharing
//!
//! The Seesaw gamepad and the TSC2007 touch controller hang off the same
//! STEMMA QT bus. Each driver gets its own [`SharedI2cDevice`] handle and
//! the handles take turns through an embassy async mutex, so a transfer in
//! progress yields to the executor instead of spinning.
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::mutex::Mutex;
//! use static_cell::StaticCell;
//!
//! static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, esp_hal::i2c::master::I2c<'static, esp_hal::Async>>> = StaticCell::new();
//!
//! let bus = I2C_BUS.init(Mutex::new(i2c));
//! let gamepad = SeesawGamepad::new(SharedI2cDevice::new(bus), Delay);
//! let touch = Tsc2007::new(SharedI2cDevice::new(bus));
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

pub struct SharedI2cDevice<'a, M: RawMutex, T> {
    bus: &'a Mutex<M, T>,
}

impl<'a, M: RawMutex, T> SharedI2cDevice<'a, M, T> {
    #[inline]
    pub const fn new(bus: &'a Mutex<M, T>) -> Self {
        Self { bus }
    }
}

impl<M: RawMutex, T: ErrorType> ErrorType for SharedI2cDevice<'_, M, T> {
    type Error = T::Error;
}

impl<M: RawMutex, T: I2c> I2c for SharedI2cDevice<'_, M, T> {
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.write(address, write).await
    }

    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.write_read(address, write, read).await
    }

    /// The lock is held for the whole transaction so no other device can
    /// interleave between its operations.
    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.transaction(address, operations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block_on, MockI2c};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn handles_share_one_bus() {
        let bus = Mutex::<NoopRawMutex, _>::new(MockI2c::new([alloc::vec![0xAB]]));
        let mut first = SharedI2cDevice::new(&bus);
        let mut second = SharedI2cDevice::new(&bus);

        block_on(first.write(0x50, &[1, 2])).unwrap();
        let mut buf = [0u8; 1];
        block_on(second.read(0x48, &mut buf)).unwrap();

        assert_eq!(buf, [0xAB]);
        let bus = bus.into_inner();
        assert_eq!(bus.writes, [(0x50, alloc::vec![1, 2])]);
    }
}

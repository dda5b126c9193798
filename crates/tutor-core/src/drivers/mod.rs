//! Drivers for the handheld's peripherals
//!
//! The gamepad and the touch controller share one I2C bus through
//! [`i2c_bus::SharedI2cDevice`]; the panel sits on its own SPI bus.

pub mod hx8357;
pub mod i2c_bus;
pub mod seesaw;
pub mod tsc2007;

pub use hx8357::Hx8357D;
pub use i2c_bus::SharedI2cDevice;
pub use seesaw::SeesawGamepad;
pub use tsc2007::Tsc2007;

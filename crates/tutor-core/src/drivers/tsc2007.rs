//! TSC2007 resistive touch controller over async I2C
//!
//! Each conversion is a one-byte command followed by a two-byte read
//! holding a 12-bit result in the top bits. A touch is reported only while
//! the Z1 pressure reading is above [`PRESSURE_THRESHOLD`].

use embedded_hal_async::i2c::I2c;
use log::trace;

use crate::touch::{RawTouch, TouchPanel};

pub const TSC2007_ADDRESS: u8 = 0x48;

/// Z1 readings at or below this are treated as no touch
pub const PRESSURE_THRESHOLD: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Function {
    MeasureTemp0 = 0,
    MeasureX = 12,
    MeasureY = 13,
    MeasureZ1 = 14,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Power {
    PowerDownIrqOn = 0,
    AdcOnIrqOff = 1,
}

/// 12-bit conversions; the 8-bit mode bit stays clear
const RESOLUTION_12BIT: u8 = 0;

const fn command(function: Function, power: Power) -> u8 {
    (function as u8) << 4 | (power as u8) << 2 | RESOLUTION_12BIT << 1
}

#[derive(Debug)]
pub enum Tsc2007Error<E> {
    I2c(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for Tsc2007Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Tsc2007Error::I2c(e) => write!(f, "TSC2007 I2C transfer failed: {:?}", e),
        }
    }
}

pub struct Tsc2007<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Tsc2007<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: TSC2007_ADDRESS,
        }
    }

    async fn convert(&mut self, function: Function, power: Power) -> Result<u16, Tsc2007Error<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[command(function, power)], &mut buf)
            .await
            .map_err(Tsc2007Error::I2c)?;
        Ok(u16::from(buf[0]) << 4 | u16::from(buf[1]) >> 4)
    }

    /// Read position and pressure, then power the ADC back down so the
    /// pen interrupt is armed again.
    pub async fn read_raw(&mut self) -> Result<RawTouch, Tsc2007Error<I::Error>> {
        let x = self.convert(Function::MeasureX, Power::AdcOnIrqOff).await?;
        let y = self.convert(Function::MeasureY, Power::AdcOnIrqOff).await?;
        let z1 = self.convert(Function::MeasureZ1, Power::AdcOnIrqOff).await?;
        self.convert(Function::MeasureTemp0, Power::PowerDownIrqOn).await?;
        Ok(RawTouch::new(x, y, z1))
    }
}

impl<I: I2c> TouchPanel for Tsc2007<I> {
    type Error = Tsc2007Error<I::Error>;

    async fn read(&mut self) -> Result<Option<RawTouch>, Self::Error> {
        let raw = self.read_raw().await?;
        if raw.pressure > PRESSURE_THRESHOLD {
            trace!("Touch at raw ({}, {}) z={}", raw.x, raw.y, raw.pressure);
            Ok(Some(raw))
        } else {
            Ok(None)
        }
    }
}

//! Adafruit Seesaw gamepad over async I2C
//!
//! Only the handful of Seesaw registers the gamepad needs: software reset,
//! bulk GPIO configuration and reads, and the ADC channels for the stick.
//! Every register read is a write of `[base, function]`, a short pause
//! while the chip prepares the answer, then a plain read.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use crate::input::{BUTTON_MASK, ControllerState, Gamepad, JOYSTICK_X_PIN, JOYSTICK_Y_PIN};

pub const SEESAW_ADDRESS: u8 = 0x50;

const STATUS_BASE: u8 = 0x00;
const STATUS_HW_ID: u8 = 0x01;
const STATUS_SWRST: u8 = 0x7F;

const GPIO_BASE: u8 = 0x01;
const GPIO_DIRCLR_BULK: u8 = 0x03;
const GPIO_BULK: u8 = 0x04;
const GPIO_BULK_SET: u8 = 0x05;
const GPIO_PULLENSET: u8 = 0x0B;

const ADC_BASE: u8 = 0x09;
const ADC_CHANNEL_OFFSET: u8 = 0x07;

const READ_DELAY_US: u32 = 1_000;
const RESET_DELAY_MS: u32 = 10;

#[derive(Debug)]
pub enum SeesawError<E> {
    I2c(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for SeesawError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SeesawError::I2c(e) => write!(f, "Seesaw I2C transfer failed: {:?}", e),
        }
    }
}

pub struct SeesawGamepad<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    initialized: bool,
}

impl<I: I2c, D: DelayNs> SeesawGamepad<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: SEESAW_ADDRESS,
            initialized: false,
        }
    }

    /// Reset the chip and configure every button pin as a pulled-up input.
    /// Returns the hardware ID the chip reports.
    pub async fn init(&mut self) -> Result<u8, SeesawError<I::Error>> {
        self.write(STATUS_BASE, STATUS_SWRST, &[0xFF]).await?;
        self.delay.delay_ms(RESET_DELAY_MS).await;

        let mut id = [0u8; 1];
        self.read(STATUS_BASE, STATUS_HW_ID, &mut id).await?;
        info!("Seesaw ready, hardware ID {:#04x}", id[0]);

        self.pin_mode_bulk_pullup(BUTTON_MASK).await?;
        self.initialized = true;
        Ok(id[0])
    }

    pub async fn pin_mode_bulk_pullup(&mut self, pins: u32) -> Result<(), SeesawError<I::Error>> {
        let mask = pins.to_be_bytes();
        self.write(GPIO_BASE, GPIO_DIRCLR_BULK, &mask).await?;
        self.write(GPIO_BASE, GPIO_PULLENSET, &mask).await?;
        self.write(GPIO_BASE, GPIO_BULK_SET, &mask).await
    }

    /// Input levels of every GPIO, masked to `pins`
    pub async fn digital_read_bulk(&mut self, pins: u32) -> Result<u32, SeesawError<I::Error>> {
        let mut buf = [0u8; 4];
        self.read(GPIO_BASE, GPIO_BULK, &mut buf).await?;
        Ok(u32::from_be_bytes(buf) & pins)
    }

    /// 10-bit ADC reading of `pin`
    pub async fn analog_read(&mut self, pin: u8) -> Result<u16, SeesawError<I::Error>> {
        let mut buf = [0u8; 2];
        self.read(ADC_BASE, ADC_CHANNEL_OFFSET + pin, &mut buf).await?;
        Ok(u16::from_be_bytes(buf))
    }

    async fn write(
        &mut self,
        base: u8,
        function: u8,
        data: &[u8],
    ) -> Result<(), SeesawError<I::Error>> {
        let mut frame = [0u8; 6];
        let len = 2 + data.len().min(4);
        frame[0] = base;
        frame[1] = function;
        frame[2..len].copy_from_slice(&data[..len - 2]);
        self.i2c
            .write(self.address, &frame[..len])
            .await
            .map_err(SeesawError::I2c)
    }

    async fn read(
        &mut self,
        base: u8,
        function: u8,
        buf: &mut [u8],
    ) -> Result<(), SeesawError<I::Error>> {
        self.i2c
            .write(self.address, &[base, function])
            .await
            .map_err(SeesawError::I2c)?;
        self.delay.delay_us(READ_DELAY_US).await;
        self.i2c
            .read(self.address, buf)
            .await
            .map_err(SeesawError::I2c)
    }
}

impl<I: I2c, D: DelayNs> Gamepad for SeesawGamepad<I, D> {
    type Error = SeesawError<I::Error>;

    async fn read(&mut self) -> Result<ControllerState, Self::Error> {
        if !self.initialized {
            self.init().await?;
        }
        let levels = self.digital_read_bulk(BUTTON_MASK).await?;
        let x = self.analog_read(JOYSTICK_X_PIN).await?;
        let y = self.analog_read(JOYSTICK_Y_PIN).await?;
        let state = ControllerState::from_raw(levels, x, y);
        if state.pressed_mask() != 0 {
            debug!("Buttons {:#x}", state.pressed_mask());
        }
        Ok(state)
    }
}

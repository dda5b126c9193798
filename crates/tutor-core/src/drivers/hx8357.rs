//! HX8357D 320x480 TFT model for `mipidsi`
//!
//! The panel is not one of mipidsi's built-in models, so [`Hx8357D`]
//! supplies the vendor init table. Windowing, pixel streaming and the
//! `DrawTarget` impl come from `mipidsi::Display`.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use mipidsi::dcs::{InterfaceExt, SetAddressMode};
use mipidsi::interface::Interface;
use mipidsi::models::Model;
use mipidsi::options::ModelOptions;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const SWRESET: u8 = 0x01;
const SLPOUT: u8 = 0x11;
const DISPON: u8 = 0x29;
const TEON: u8 = 0x35;
const COLMOD: u8 = 0x3A;
const TEARLINE: u8 = 0x44;
const SETOSC: u8 = 0xB0;
const SETPWR1: u8 = 0xB1;
const SETRGB: u8 = 0xB3;
const SETCYC: u8 = 0xB4;
const SETCOM: u8 = 0xB6;
const SETC: u8 = 0xB9;
const SETSTBA: u8 = 0xC0;
const SETPANEL: u8 = 0xCC;
const SETGAMMA: u8 = 0xE0;

/// 16 bits per pixel on both interfaces
const COLMOD_RGB565: u8 = 0x55;

struct InitStep {
    command: u8,
    params: &'static [u8],
    delay_ms: u32,
}

const fn step(command: u8, params: &'static [u8], delay_ms: u32) -> InitStep {
    InitStep {
        command,
        params,
        delay_ms,
    }
}

/// Everything up to sleep-out. MADCTL is written from the builder's
/// orientation between this table and [`WAKE_SEQUENCE`].
const INIT_SEQUENCE: &[InitStep] = &[
    step(SWRESET, &[], 100),
    // unlock the extended command set
    step(SETC, &[0xFF, 0x83, 0x57], 300),
    step(SETRGB, &[0x80, 0x00, 0x06, 0x06], 0),
    step(SETCOM, &[0x25], 0),
    step(SETOSC, &[0x68], 0),
    step(SETPANEL, &[0x05], 0),
    step(SETPWR1, &[0x00, 0x15, 0x1C, 0x1C, 0x83, 0xAA], 0),
    step(SETSTBA, &[0x50, 0x50, 0x01, 0x3C, 0x1E, 0x08], 0),
    step(SETCYC, &[0x02, 0x40, 0x00, 0x2A, 0x2A, 0x0D, 0x78], 0),
    step(
        SETGAMMA,
        &[
            0x02, 0x0A, 0x11, 0x1D, 0x23, 0x35, 0x41, 0x4B, 0x4B, 0x42, 0x3A, 0x27, 0x1B, 0x08,
            0x09, 0x03, 0x02, 0x0A, 0x11, 0x1D, 0x23, 0x35, 0x41, 0x4B, 0x4B, 0x42, 0x3A, 0x27,
            0x1B, 0x08, 0x09, 0x03, 0x00, 0x01,
        ],
        0,
    ),
    step(COLMOD, &[COLMOD_RGB565], 0),
    step(TEON, &[0x00], 0),
    step(TEARLINE, &[0x00, 0x02], 0),
];

const WAKE_SEQUENCE: &[InitStep] = &[step(SLPOUT, &[], 150), step(DISPON, &[], 50)];

/// Adafruit 3.5" HX8357D breakout, RGB565 over 4-wire SPI
#[derive(Debug, Clone, Copy, Default)]
pub struct Hx8357D;

fn send_steps<DI, DELAY>(
    di: &mut DI,
    delay: &mut DELAY,
    steps: &[InitStep],
) -> Result<(), DI::Error>
where
    DI: Interface,
    DELAY: DelayNs,
{
    for step in steps {
        di.send_command(step.command, step.params)?;
        if step.delay_ms > 0 {
            delay.delay_ms(step.delay_ms);
        }
    }
    Ok(())
}

impl Model for Hx8357D {
    type ColorFormat = Rgb565;
    const FRAMEBUFFER_SIZE: (u16, u16) = (DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX);

    fn init<DELAY, DI>(
        &mut self,
        di: &mut DI,
        delay: &mut DELAY,
        options: &ModelOptions,
    ) -> Result<SetAddressMode, DI::Error>
    where
        DELAY: DelayNs,
        DI: Interface,
    {
        send_steps(di, delay, INIT_SEQUENCE)?;

        di.write_command(SetAddressMode::from(options))?;

        send_steps(di, delay, WAKE_SEQUENCE)?;
        Ok(SetAddressMode::from(options))
    }
}

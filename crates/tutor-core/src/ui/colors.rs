//! Color definitions
//!
//! All colors are RGB565. To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;

/// Convert a 0xRRGGBB literal to RGB565
pub const fn hex(rgb: u32) -> Rgb565 {
    Rgb565::new(
        ((rgb >> 16) & 0xff) as u8 >> 3,
        ((rgb >> 8) & 0xff) as u8 >> 2,
        (rgb & 0xff) as u8 >> 3,
    )
}

pub const COLOR_BACKGROUND: Rgb565 = hex(0x000000);

pub const COLOR_TEXT: Rgb565 = hex(0xFFFFFF);

/// Grid lines around keys, the search bar and result rows
pub const COLOR_DIVIDER: Rgb565 = hex(0xFFFFFF);

/// Keyboard cell fill
pub const COLOR_KEYBOARD: Rgb565 = hex(0x0000FF);

/// Text color of the selected key
pub const COLOR_KEY_HIGHLIGHT: Rgb565 = hex(0xFF0000);

/// Text color of the selected result row
pub const COLOR_RESULT_HIGHLIGHT: Rgb565 = hex(0x03FC8C);

/// Progress bar fill and normal status text
pub const COLOR_PROGRESS: Rgb565 = hex(0x00FF00);

/// Status text for failures
pub const COLOR_PROGRESS_ERROR: Rgb565 = hex(0xFF0000);

pub const COLOR_PROGRESS_OUTLINE: Rgb565 = hex(0xFFFFFF);

/// Card page backdrop
pub const COLOR_CARD_BACKGROUND: Rgb565 = hex(0xFFFFFF);

pub const CANVAS_RED: Rgb565 = hex(0xFF0000);
pub const CANVAS_GREEN: Rgb565 = hex(0x00FF00);
pub const CANVAS_BLUE: Rgb565 = hex(0x0000FF);

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::RgbColor;

    #[test]
    fn hex_matches_builtin_colors() {
        assert_eq!(hex(0xFFFFFF), Rgb565::WHITE);
        assert_eq!(hex(0xFF0000), Rgb565::RED);
        assert_eq!(hex(0x0000FF), Rgb565::BLUE);
        assert_eq!(hex(0x03FC8C), Rgb565::new(0, 63, 17));
    }
}

//! WiFi Error page
//!
//! Shown by the firmware when the network never comes up. The device halts
//! on this page.

use crate::pages::{Page, PageId};
use crate::ui::core::screen_bounds;
use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{FONT_6X10, FONT_10X20},
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
    text::{Alignment, Text},
};

const LINE_HEIGHT_PX: i32 = 20;

/// Full-screen error message for a failed WiFi connection
pub struct WifiErrorPage {
    dirty: bool,
    error_message: &'static str,
    ssid: heapless::String<32>,
}

impl WifiErrorPage {
    /// Create a new WiFi error page with default error message
    pub fn new(ssid: &str) -> Self {
        Self::with_message("WiFi Connection Failed", ssid)
    }

    /// Create a new WiFi error page with a custom error message
    pub fn with_message(message: &'static str, ssid: &str) -> Self {
        let mut stored = heapless::String::new();
        for ch in ssid.chars() {
            if stored.push(ch).is_err() {
                break;
            }
        }
        Self {
            dirty: true,
            error_message: message,
            ssid: stored,
        }
    }
}

impl Page for WifiErrorPage {
    fn id(&self) -> PageId {
        PageId::WifiError
    }

    fn title(&self) -> &str {
        "WiFi Error"
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if !self.dirty {
            return Ok(());
        }

        display.clear(Rgb565::BLACK)?;

        let center_x = (DISPLAY_WIDTH_PX / 2) as i32;
        let center_y = (DISPLAY_HEIGHT_PX / 2) as i32;

        Text::with_alignment(
            self.error_message,
            Point::new(center_x, center_y - LINE_HEIGHT_PX),
            MonoTextStyle::new(&FONT_10X20, Rgb565::RED),
            Alignment::Center,
        )
        .draw(display)?;

        Text::with_alignment(
            "Check WIFI_SSID and",
            Point::new(center_x, center_y + LINE_HEIGHT_PX),
            MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE),
            Alignment::Center,
        )
        .draw(display)?;

        Text::with_alignment(
            "WIFI_PASSWORD in .env",
            Point::new(center_x, center_y + 2 * LINE_HEIGHT_PX),
            MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE),
            Alignment::Center,
        )
        .draw(display)?;

        if !self.ssid.is_empty() {
            Text::with_alignment(
                &self.ssid,
                Point::new(center_x, center_y + 4 * LINE_HEIGHT_PX),
                MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE),
                Alignment::Center,
            )
            .draw(display)?;
        }

        self.dirty = false;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        screen_bounds()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn draws_once_until_marked_dirty() {
        let mut page = WifiErrorPage::new("home-network");
        let mut fb = FrameBuffer::new();
        fb.clear(Rgb565::WHITE).unwrap();
        fb.take_dirty();

        page.draw_page(&mut fb).unwrap();
        assert!(!page.is_dirty());
        assert!(fb.take_dirty().is_some());

        page.draw_page(&mut fb).unwrap();
        assert_eq!(fb.take_dirty(), None);
    }

    #[test]
    fn long_ssid_is_truncated() {
        let page = WifiErrorPage::new("a-network-name-that-is-way-too-long-to-be-valid");
        assert_eq!(page.ssid.len(), 32);
    }
}

//! Loading overlay: a horizontal progress bar with a status line

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;
use embedded_graphics::Drawable as _;

use super::colors::{
    COLOR_BACKGROUND, COLOR_PROGRESS, COLOR_PROGRESS_ERROR, COLOR_PROGRESS_OUTLINE,
};
use super::core::Drawable;
use super::label::Label;

/// Area blanked behind the bar and label
const BACKDROP: Rectangle = Rectangle::new(Point::new(0, 150), Size::new(320, 90));

const BAR: Rectangle = Rectangle::new(Point::new(20, 150), Size::new(280, 60));

const STATUS: Rectangle = Rectangle::new(Point::new(0, 212), Size::new(320, 26));

pub struct ProgressOverlay {
    visible: bool,
    percent: u8,
    status: Label,
    dirty: bool,
}

impl Default for ProgressOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressOverlay {
    pub fn new() -> Self {
        Self {
            visible: false,
            percent: 0,
            status: Label::new(STATUS, "", &FONT_10X20)
                .with_color(COLOR_PROGRESS)
                .with_alignment(Alignment::Center),
            dirty: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn status(&self) -> &str {
        self.status.text()
    }

    pub fn is_error(&self) -> bool {
        self.status.color() == COLOR_PROGRESS_ERROR
    }

    /// Show an empty bar with a blank status line
    pub fn show(&mut self) {
        self.visible = true;
        self.percent = 0;
        self.status.set_text("");
        self.status.set_color(COLOR_PROGRESS);
        self.dirty = true;
    }

    /// Remove the overlay. The page underneath must be redrawn by the caller.
    pub fn hide(&mut self) {
        self.visible = false;
        self.dirty = false;
    }

    /// Update the status text and bar position
    pub fn set(&mut self, status: &str, percent: u8) {
        self.status.set_text(status);
        self.set_percent(percent);
        self.dirty = true;
    }

    pub fn set_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent != self.percent {
            self.percent = percent;
            self.dirty = true;
        }
    }

    /// Show `status` in red, leaving the bar where it is
    pub fn fail(&mut self, status: &str) {
        self.status.set_text(status);
        self.status.set_color(COLOR_PROGRESS_ERROR);
        self.dirty = true;
    }

    fn filled(&self) -> Rectangle {
        let inner = BAR.offset(-1);
        let width = inner.size.width * self.percent as u32 / 100;
        Rectangle::new(inner.top_left, Size::new(width, inner.size.height))
    }
}

impl Drawable for ProgressOverlay {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        if !self.visible {
            return Ok(());
        }

        BACKDROP
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;
        BAR.into_styled(PrimitiveStyle::with_stroke(COLOR_PROGRESS_OUTLINE, 1))
            .draw(display)?;
        self.filled()
            .into_styled(PrimitiveStyle::with_fill(COLOR_PROGRESS))
            .draw(display)?;
        self.status.draw(display)
    }

    fn bounds(&self) -> Rectangle {
        BACKDROP
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

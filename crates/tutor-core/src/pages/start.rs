//! Start page: title, splash image and a short controls summary

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use crate::image::Bitmap;
use crate::pages::{Page, PageId};
use crate::ui::colors::COLOR_BACKGROUND;
use crate::ui::{Drawable, Label};

/// Where the splash image's top-left corner goes
pub const SPLASH_ORIGIN: Point = Point::new(0, 100);

const HELP_TEXT: &str = "\
Push SELECT to enter search screen. Use stick to
move, A to enter, B to delete, X for space, SELECT
to search, or Y to move to results. In results,
use A to load card or START to return to keyboard.
In card, touch to draw, pick color/erase w/XABY.
Clear w/SELECT & exit w/START. Have fun!";

pub struct StartPage {
    title: Label,
    help: Label,
    splash: Option<Bitmap>,
    dirty: bool,
}

impl StartPage {
    pub fn new(splash: Option<Bitmap>) -> Self {
        Self {
            title: Label::new(
                Rectangle::new(Point::new(0, 25), Size::new(320, 50)),
                "Welcome to\nPersonal Tutor",
                &FONT_10X20,
            )
            .with_alignment(Alignment::Center),
            help: Label::new(
                Rectangle::new(Point::new(0, 380), Size::new(320, 70)),
                HELP_TEXT,
                &FONT_6X10,
            )
            .with_padding(6),
            splash,
            dirty: true,
        }
    }
}

impl Page for StartPage {
    fn id(&self) -> PageId {
        PageId::Start
    }

    fn title(&self) -> &str {
        "Start"
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if !self.dirty {
            return Ok(());
        }

        display.clear(COLOR_BACKGROUND)?;
        self.title.draw(display)?;
        if let Some(splash) = &self.splash {
            splash.draw_at(SPLASH_ORIGIN, display)?;
        }
        self.help.draw(display)?;

        self.mark_clean();
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.title.mark_clean();
        self.help.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

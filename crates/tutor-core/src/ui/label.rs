//! Text labels
//!
//! [`Label`] draws fixed text inside a rectangle. [`ScrollingLabel`] shows a
//! window of at most `max_chars` characters and, while animated, rotates
//! longer text through that window one character per step.

use alloc::string::String;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics::Drawable as _;

use super::colors::{COLOR_BACKGROUND, COLOR_TEXT};
use super::core::Drawable;

/// Blank characters shown between the end of scrolling text and its restart
pub const SCROLL_GAP: usize = 3;

pub struct Label {
    bounds: Rectangle,
    text: String,
    font: &'static MonoFont<'static>,
    color: Rgb565,
    background: Option<Rgb565>,
    alignment: Alignment,
    padding: u32,
    dirty: bool,
}

impl Label {
    /// Left-aligned white text on black
    pub fn new(bounds: Rectangle, text: &str, font: &'static MonoFont<'static>) -> Self {
        Self {
            bounds,
            text: text.into(),
            font,
            color: COLOR_TEXT,
            background: Some(COLOR_BACKGROUND),
            alignment: Alignment::Left,
            padding: 0,
            dirty: true,
        }
    }

    pub fn with_color(mut self, color: Rgb565) -> Self {
        self.color = color;
        self
    }

    /// `None` draws text only, leaving whatever is underneath
    pub fn with_background(mut self, background: Option<Rgb565>) -> Self {
        self.background = background;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgb565 {
        self.color
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.dirty = true;
        }
    }

    pub fn set_color(&mut self, color: Rgb565) {
        if self.color != color {
            self.color = color;
            self.dirty = true;
        }
    }

    fn anchor(&self) -> Point {
        let lines = self.text.lines().count().max(1) as u32;
        let text_height = lines * self.font.character_size.height;
        let y = self.bounds.top_left.y
            + (self.bounds.size.height.saturating_sub(text_height) / 2) as i32;
        let x = match self.alignment {
            Alignment::Left => self.bounds.top_left.x + self.padding as i32,
            Alignment::Center => self.bounds.center().x,
            Alignment::Right => {
                self.bounds.top_left.x + self.bounds.size.width as i32 - self.padding as i32
            }
        };
        Point::new(x, y)
    }
}

impl Drawable for Label {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        if let Some(background) = self.background {
            self.bounds
                .into_styled(PrimitiveStyle::with_fill(background))
                .draw(display)?;
        }

        let character_style = MonoTextStyle::new(self.font, self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Top)
            .build();
        Text::with_text_style(&self.text, self.anchor(), character_style, text_style)
            .draw(display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
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

pub struct ScrollingLabel {
    label: Label,
    full_text: String,
    max_chars: usize,
    offset: usize,
    last_step_ms: Option<u64>,
}

impl ScrollingLabel {
    pub fn new(label: Label, max_chars: usize) -> Self {
        let mut scrolling = Self {
            label,
            full_text: String::new(),
            max_chars,
            offset: 0,
            last_step_ms: None,
        };
        let text = String::from(scrolling.label.text());
        scrolling.set_text(&text);
        scrolling
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Currently visible window
    pub fn visible_text(&self) -> &str {
        self.label.text()
    }

    pub fn set_text(&mut self, text: &str) {
        self.full_text.clear();
        self.full_text.push_str(text);
        self.offset = 0;
        self.last_step_ms = None;
        self.refresh();
    }

    pub fn set_color(&mut self, color: Rgb565) {
        self.label.set_color(color);
    }

    pub fn color(&self) -> Rgb565 {
        self.label.color()
    }

    /// Rewind to the start of the text
    pub fn reset(&mut self) {
        self.offset = 0;
        self.last_step_ms = None;
        self.refresh();
    }

    fn char_count(&self) -> usize {
        self.full_text.chars().count()
    }

    /// Advance one character if `step_ms` has passed since the last step.
    /// The first call only starts the clock. Returns whether the visible
    /// text changed.
    pub fn animate(&mut self, now_ms: u64, step_ms: u32) -> bool {
        let len = self.char_count();
        if len <= self.max_chars {
            return false;
        }

        match self.last_step_ms {
            None => {
                self.last_step_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms.saturating_sub(last) >= step_ms as u64 => {
                self.offset = (self.offset + 1) % (len + SCROLL_GAP);
                self.last_step_ms = Some(now_ms);
                self.refresh();
                true
            }
            Some(_) => false,
        }
    }

    fn refresh(&mut self) {
        let len = self.char_count();
        let window: String = if len <= self.max_chars {
            self.full_text.clone()
        } else {
            self.full_text
                .chars()
                .chain(core::iter::repeat_n(' ', SCROLL_GAP))
                .cycle()
                .skip(self.offset)
                .take(self.max_chars)
                .collect()
        };
        self.label.set_text(&window);
    }
}

impl Drawable for ScrollingLabel {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        self.label.draw(display)
    }

    fn bounds(&self) -> Rectangle {
        self.label.bounds()
    }

    fn is_dirty(&self) -> bool {
        self.label.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.label.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.label.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_10X20;

    fn scrolling(text: &str, max_chars: usize) -> ScrollingLabel {
        let label = Label::new(Rectangle::new(Point::zero(), Size::new(288, 32)), "", &FONT_10X20);
        let mut scrolling = ScrollingLabel::new(label, max_chars);
        scrolling.set_text(text);
        scrolling
    }

    #[test]
    fn set_text_marks_dirty_only_on_change() {
        let mut label = Label::new(Rectangle::new(Point::zero(), Size::new(10, 10)), "a", &FONT_10X20);
        label.mark_clean();
        label.set_text("a");
        assert!(!label.is_dirty());
        label.set_text("b");
        assert!(label.is_dirty());
    }

    #[test]
    fn short_text_never_scrolls() {
        let mut label = scrolling("Shock", 8);
        assert!(!label.animate(0, 1000));
        assert!(!label.animate(5000, 1000));
        assert_eq!(label.visible_text(), "Shock");
    }

    #[test]
    fn long_text_shows_window_and_steps_on_interval() {
        let mut label = scrolling("Lightning Bolt", 8);
        assert_eq!(label.visible_text(), "Lightnin");

        assert!(!label.animate(0, 1000));
        assert!(!label.animate(999, 1000));
        assert!(label.animate(1000, 1000));
        assert_eq!(label.visible_text(), "ightning");
        assert!(label.animate(2000, 1000));
        assert_eq!(label.visible_text(), "ghtning ");
    }

    #[test]
    fn scrolling_wraps_through_gap() {
        let mut label = scrolling("abcdef", 4);
        let mut now = 0;
        label.animate(now, 10);
        for _ in 0..4 {
            now += 10;
            label.animate(now, 10);
        }
        assert_eq!(label.visible_text(), "ef  ");
        for _ in 0..5 {
            now += 10;
            label.animate(now, 10);
        }
        // back to the start after len + gap steps
        assert_eq!(label.visible_text(), "abcd");
    }

    #[test]
    fn reset_rewinds() {
        let mut label = scrolling("Lightning Bolt", 8);
        label.animate(0, 1);
        label.animate(1, 1);
        label.reset();
        assert_eq!(label.visible_text(), "Lightnin");
        assert!(!label.animate(100, 1));
    }
}

//! Search page: query bar, result list and on-screen keyboard

pub mod keyboard;
pub mod results;

pub use keyboard::Keyboard;
pub use results::ResultList;

use alloc::string::String;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::api::CardResult;
use crate::pages::{Page, PageId};
use crate::ui::colors::{COLOR_BACKGROUND, COLOR_DIVIDER};
use crate::ui::{Drawable, GridLayout, Label};

/// Characters of the query shown in the search bar
pub const QUERY_VISIBLE_CHARS: usize = 23;

const SEARCH_BAR_BOUNDS: Rectangle = Rectangle::new(Point::new(16, 10), Size::new(288, 32));

const SEARCH_BAR_PADDING: u32 = 5;

pub struct SearchPage {
    bar: GridLayout,
    query: Label,
    results: ResultList,
    keyboard: Keyboard,
    /// Background and frames need a repaint
    dirty: bool,
}

impl Default for SearchPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPage {
    pub fn new() -> Self {
        let bar = GridLayout::new(SEARCH_BAR_BOUNDS, 1, 1).with_divider(COLOR_DIVIDER);
        let query = Label::new(
            bar.cell(0, 0).offset(-(SEARCH_BAR_PADDING as i32)),
            "",
            &FONT_10X20,
        );
        Self {
            bar,
            query,
            results: ResultList::new(),
            keyboard: Keyboard::new(),
            dirty: true,
        }
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    pub fn results(&self) -> &ResultList {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultList {
        &mut self.results
    }

    /// Text currently in the search bar
    pub fn query_text(&self) -> &str {
        self.query.text()
    }

    /// Show the tail of `query` in the search bar
    pub fn set_query(&mut self, query: &str) {
        let skip = query.chars().count().saturating_sub(QUERY_VISIBLE_CHARS);
        let tail: String = query.chars().skip(skip).collect();
        self.query.set_text(&tail);
    }

    pub fn show_results(&mut self, cards: &[CardResult]) {
        self.results.set_cards(cards);
    }
}

impl Page for SearchPage {
    fn id(&self) -> PageId {
        PageId::Search
    }

    fn title(&self) -> &str {
        "Search"
    }

    /// Fresh keyboard cursor, no result highlighted, full repaint
    fn on_activate(&mut self) {
        self.keyboard.reset();
        self.results.clear_selection();
        self.mark_dirty();
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if self.dirty {
            display.clear(COLOR_BACKGROUND)?;
            self.bar.draw_dividers(display)?;
            self.dirty = false;
        }
        self.query.draw_if_dirty(display)?;
        self.results.draw_dirty(display)?;
        self.keyboard.draw_dirty(display)?;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.dirty || self.query.is_dirty() || self.results.is_dirty() || self.keyboard.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.query.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.query.mark_dirty();
        self.results.mark_dirty();
        self.keyboard.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::ui::colors::{COLOR_KEYBOARD, COLOR_KEY_HIGHLIGHT};

    #[test]
    fn long_query_shows_its_tail() {
        let mut page = SearchPage::new();
        page.set_query("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(page.query_text(), "defghijklmnopqrstuvwxyz");
        assert_eq!(page.query_text().len(), QUERY_VISIBLE_CHARS);

        page.set_query("bolt");
        assert_eq!(page.query_text(), "bolt");
    }

    #[test]
    fn full_draw_then_nothing_left_dirty() {
        let mut page = SearchPage::new();
        let mut fb = FrameBuffer::new();
        page.draw_page(&mut fb).unwrap();
        assert!(!page.is_dirty());

        // keyboard cell interior is filled with the key color
        assert_eq!(fb.pixel(Point::new(36, 345)), Some(COLOR_KEYBOARD));
        assert_eq!(fb.pixel(Point::new(33, 342)), Some(COLOR_DIVIDER));
    }

    #[test]
    fn cursor_move_redraws_only_two_keys() {
        let mut page = SearchPage::new();
        let mut fb = FrameBuffer::new();
        page.draw_page(&mut fb).unwrap();
        fb.take_dirty();

        page.keyboard_mut().move_cursor(1, 0);
        assert!(page.is_dirty());
        page.draw_page(&mut fb).unwrap();

        let changed = fb.take_dirty().unwrap();
        assert!(changed.top_left.y >= 342);
        assert!(changed.size.width < 100);
        assert_eq!(page.keyboard().key_color(1, 0), Some(COLOR_KEY_HIGHLIGHT));
    }

    #[test]
    fn activation_resets_keyboard_and_selection() {
        let mut page = SearchPage::new();
        page.keyboard_mut().move_cursor(3, 2);
        page.results_mut().select(4);
        page.on_activate();
        assert_eq!(page.keyboard().cursor(), (0, 0));
        assert_eq!(page.results().selected(), None);
        assert!(page.is_dirty());
    }
}

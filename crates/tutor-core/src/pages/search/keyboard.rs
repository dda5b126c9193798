//! On-screen keyboard: a 7x4 character grid navigated with the stick

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use log::debug;

use crate::ui::colors::{COLOR_DIVIDER, COLOR_KEY_HIGHLIGHT, COLOR_KEYBOARD, COLOR_TEXT};
use crate::ui::{Drawable, GridLayout, Label};

pub const KEY_CHARS: &str = "abcdefghijklmnopqrstuvwxyz-'";

pub const KEY_COLUMNS: u32 = 7;
pub const KEY_ROWS: u32 = 4;

const KEYBOARD_BOUNDS: Rectangle = Rectangle::new(Point::new(33, 342), Size::new(254, 128));

pub struct Keyboard {
    grid: GridLayout,
    keys: heapless::Vec<Label, { (KEY_COLUMNS * KEY_ROWS) as usize }>,
    column: u32,
    row: u32,
    active: bool,
    /// Grid lines need a repaint
    frame_dirty: bool,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        let grid = GridLayout::new(KEYBOARD_BOUNDS, KEY_COLUMNS, KEY_ROWS).with_divider(COLOR_DIVIDER);
        let mut keys = heapless::Vec::new();
        let mut buf = [0u8; 4];
        for (i, ch) in KEY_CHARS.chars().enumerate() {
            let cell = grid.cell(i as u32 % KEY_COLUMNS, i as u32 / KEY_COLUMNS);
            let label = Label::new(cell.offset(-1), ch.encode_utf8(&mut buf), &FONT_10X20)
                .with_background(Some(COLOR_KEYBOARD))
                .with_alignment(Alignment::Center);
            // KEY_CHARS has exactly as many characters as the grid has cells
            let _ = keys.push(label);
        }

        let mut keyboard = Self {
            grid,
            keys,
            column: 0,
            row: 0,
            active: true,
            frame_dirty: true,
        };
        keyboard.apply_highlight(true);
        keyboard
    }

    fn index(&self) -> usize {
        (self.row * KEY_COLUMNS + self.column) as usize
    }

    /// (column, row) of the highlighted key
    pub fn cursor(&self) -> (u32, u32) {
        (self.column, self.row)
    }

    pub fn selected_char(&self) -> char {
        KEY_CHARS.chars().nth(self.index()).unwrap_or(' ')
    }

    fn apply_highlight(&mut self, on: bool) {
        let color = if on { COLOR_KEY_HIGHLIGHT } else { COLOR_TEXT };
        let index = self.index();
        if let Some(key) = self.keys.get_mut(index) {
            key.set_color(color);
        }
    }

    /// Move the cursor, wrapping at every edge
    pub fn move_cursor(&mut self, columns: i32, rows: i32) {
        self.apply_highlight(false);
        self.column = (self.column as i32 + columns).rem_euclid(KEY_COLUMNS as i32) as u32;
        self.row = (self.row as i32 + rows).rem_euclid(KEY_ROWS as i32) as u32;
        debug!("Key cursor at ({}, {}) '{}'", self.column, self.row, self.selected_char());
        self.apply_highlight(self.active);
    }

    /// Back to the top-left key, highlighted
    pub fn reset(&mut self) {
        self.apply_highlight(false);
        self.column = 0;
        self.row = 0;
        self.set_active(true);
    }

    /// While inactive the cursor is not highlighted
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.apply_highlight(active);
    }

    pub fn key_color(&self, column: u32, row: u32) -> Option<Rgb565> {
        self.keys
            .get((row * KEY_COLUMNS + column) as usize)
            .map(Label::color)
    }

    pub fn draw_dirty<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if self.frame_dirty {
            self.grid.draw_dividers(display)?;
            self.frame_dirty = false;
        }
        for key in self.keys.iter_mut() {
            key.draw_if_dirty(display)?;
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.frame_dirty || self.keys.iter().any(Drawable::is_dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.frame_dirty = true;
        self.keys.iter_mut().for_each(Drawable::mark_dirty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_all_characters() {
        let keyboard = Keyboard::new();
        assert_eq!(KEY_CHARS.len(), (KEY_COLUMNS * KEY_ROWS) as usize);
        assert_eq!(keyboard.keys.len(), KEY_CHARS.len());
        assert_eq!(keyboard.selected_char(), 'a');
    }

    #[test]
    fn cursor_wraps_in_both_directions() {
        let mut keyboard = Keyboard::new();
        keyboard.move_cursor(-1, 0);
        assert_eq!(keyboard.cursor(), (6, 0));
        assert_eq!(keyboard.selected_char(), 'g');

        keyboard.move_cursor(0, -1);
        assert_eq!(keyboard.cursor(), (6, 3));
        assert_eq!(keyboard.selected_char(), '\'');

        keyboard.move_cursor(1, 1);
        assert_eq!(keyboard.cursor(), (0, 0));
    }

    #[test]
    fn only_cursor_key_is_highlighted() {
        let mut keyboard = Keyboard::new();
        keyboard.move_cursor(2, 1);
        assert_eq!(keyboard.selected_char(), 'j');
        assert_eq!(keyboard.key_color(2, 1), Some(COLOR_KEY_HIGHLIGHT));
        assert_eq!(keyboard.key_color(0, 0), Some(COLOR_TEXT));

        keyboard.set_active(false);
        assert_eq!(keyboard.key_color(2, 1), Some(COLOR_TEXT));

        keyboard.reset();
        assert_eq!(keyboard.cursor(), (0, 0));
        assert_eq!(keyboard.key_color(0, 0), Some(COLOR_KEY_HIGHLIGHT));
        assert_eq!(keyboard.key_color(2, 1), Some(COLOR_TEXT));
    }
}

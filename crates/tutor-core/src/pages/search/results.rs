//! Result list: eight scrolling rows with one highlighted

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::api::{CardResult, MAX_RESULTS};
use crate::ui::colors::{COLOR_RESULT_HIGHLIGHT, COLOR_TEXT};
use crate::ui::{Drawable, GridLayout, Label, ScrollingLabel};

/// Characters visible per row before it has to scroll
pub const ROW_CHARS: usize = 23;

const RESULTS_BOUNDS: Rectangle = Rectangle::new(Point::new(16, 52), Size::new(288, 288));

/// The grid has room for one more row than is ever filled
const GRID_ROWS: u32 = MAX_RESULTS as u32 + 1;

pub struct ResultList {
    rows: heapless::Vec<ScrollingLabel, MAX_RESULTS>,
    selected: Option<usize>,
}

impl Default for ResultList {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultList {
    pub fn new() -> Self {
        let grid = GridLayout::new(RESULTS_BOUNDS, 1, GRID_ROWS);
        let mut rows = heapless::Vec::new();
        for row in 0..MAX_RESULTS as u32 {
            let label = Label::new(grid.cell(0, row), "", &FONT_10X20).with_padding(4);
            let _ = rows.push(ScrollingLabel::new(label, ROW_CHARS));
        }
        Self {
            rows,
            selected: None,
        }
    }

    /// Fill rows from `cards`; rows past the end are blanked
    pub fn set_cards(&mut self, cards: &[CardResult]) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.set_text(cards.get(i).map_or("", |card| card.name.as_str()));
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn row_text(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(ScrollingLabel::visible_text)
    }

    pub fn row_color(&self, row: usize) -> Option<Rgb565> {
        self.rows.get(row).map(ScrollingLabel::color)
    }

    /// Highlight `row`, un-highlighting and rewinding the previous one
    pub fn select(&mut self, row: usize) {
        if let Some(previous) = self.selected.and_then(|i| self.rows.get_mut(i)) {
            previous.set_color(COLOR_TEXT);
            previous.reset();
        }
        let row = row % MAX_RESULTS;
        if let Some(current) = self.rows.get_mut(row) {
            current.set_color(COLOR_RESULT_HIGHLIGHT);
        }
        self.selected = Some(row);
        debug!("Result row {} selected", row);
    }

    /// Move the highlight by `step` rows with wraparound over every slot
    pub fn move_selection(&mut self, step: i32) {
        let current = self.selected.unwrap_or(0) as i32;
        self.select((current + step).rem_euclid(MAX_RESULTS as i32) as usize);
    }

    /// Drop the highlight and rewind the highlighted row
    pub fn clear_selection(&mut self) {
        if let Some(row) = self.selected.take().and_then(|i| self.rows.get_mut(i)) {
            row.set_color(COLOR_TEXT);
            row.reset();
        }
    }

    /// Step the highlighted row's scroll animation. Returns whether it changed.
    pub fn animate(&mut self, now_ms: u64, step_ms: u32) -> bool {
        match self.selected.and_then(|i| self.rows.get_mut(i)) {
            Some(row) => row.animate(now_ms, step_ms),
            None => false,
        }
    }

    pub fn draw_dirty<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        for row in self.rows.iter_mut() {
            row.draw_if_dirty(display)?;
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.rows.iter().any(Drawable::is_dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.rows.iter_mut().for_each(Drawable::mark_dirty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn cards(names: &[&str]) -> Vec<CardResult> {
        names.iter().map(|name| CardResult::new(name, "")).collect()
    }

    #[test]
    fn rows_show_names_and_blank_the_rest() {
        let mut list = ResultList::new();
        list.set_cards(&cards(&["Lightning Bolt", "Shock"]));
        assert_eq!(list.row_text(0), Some("Lightning Bolt"));
        assert_eq!(list.row_text(1), Some("Shock"));
        assert_eq!(list.row_text(2), Some(""));

        list.set_cards(&[]);
        assert_eq!(list.row_text(0), Some(""));
    }

    #[test]
    fn long_names_are_windowed() {
        let mut list = ResultList::new();
        list.set_cards(&cards(&["Jace, the Mind Sculptor of Vryn"]));
        assert_eq!(list.row_text(0).map(str::len), Some(ROW_CHARS));
    }

    #[test]
    fn selection_wraps_over_all_slots() {
        let mut list = ResultList::new();
        list.set_cards(&cards(&["A", "B"]));
        list.select(0);
        list.move_selection(-1);
        assert_eq!(list.selected(), Some(7));
        list.move_selection(1);
        assert_eq!(list.selected(), Some(0));
        assert_eq!(list.row_color(0), Some(COLOR_RESULT_HIGHLIGHT));
        assert_eq!(list.row_color(7), Some(COLOR_TEXT));
    }

    #[test]
    fn moving_away_rewinds_previous_row() {
        let mut list = ResultList::new();
        list.set_cards(&cards(&["An Extremely Long Card Name Here", "B"]));
        list.select(0);
        list.animate(0, 1000);
        assert!(list.animate(1000, 1000));
        assert!(list.row_text(0).is_some_and(|text| text.starts_with("n E")));

        list.move_selection(1);
        assert!(list.row_text(0).is_some_and(|text| text.starts_with("An E")));
    }

    #[test]
    fn only_highlighted_row_animates() {
        let mut list = ResultList::new();
        let long = "An Extremely Long Card Name Here";
        list.set_cards(&cards(&[long, long]));
        assert!(!list.animate(0, 1));
        list.select(1);
        list.animate(0, 1);
        assert!(list.animate(5, 1));
        assert!(list.row_text(0).is_some_and(|text| text.starts_with("An E")));
        assert!(list.row_text(1).is_some_and(|text| text.starts_with("n E")));
    }
}

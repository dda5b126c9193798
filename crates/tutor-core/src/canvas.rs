//! Indexed annotation overlay drawn on top of the card image

use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::input::{Button, ControllerState};
use crate::ui::colors::{CANVAS_BLUE, CANVAS_GREEN, CANVAS_RED};

/// Edge length of the square painted per touch sample
pub const BRUSH_SIZE: u32 = 5;

/// Palette index of one canvas pixel. Index 0 is see-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CanvasColor {
    #[default]
    Transparent = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
}

impl CanvasColor {
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => CanvasColor::Red,
            2 => CanvasColor::Green,
            3 => CanvasColor::Blue,
            _ => CanvasColor::Transparent,
        }
    }

    /// Display color, or `None` for the transparent entry
    pub fn rgb(self) -> Option<Rgb565> {
        match self {
            CanvasColor::Transparent => None,
            CanvasColor::Red => Some(CANVAS_RED),
            CanvasColor::Green => Some(CANVAS_GREEN),
            CanvasColor::Blue => Some(CANVAS_BLUE),
        }
    }

    /// Brush color selected by held buttons: X red, A green, B blue and Y
    /// the eraser. When several are held the later one in that order wins.
    pub fn from_buttons(state: &ControllerState) -> Option<Self> {
        [
            (Button::X, CanvasColor::Red),
            (Button::A, CanvasColor::Green),
            (Button::B, CanvasColor::Blue),
            (Button::Y, CanvasColor::Transparent),
        ]
        .into_iter()
        .filter(|(button, _)| state.is_pressed(*button))
        .map(|(_, color)| color)
        .last()
    }
}

pub struct Canvas {
    size: Size,
    pixels: Vec<u8>,
    brush: CanvasColor,
}

impl Canvas {
    /// Empty canvas; the brush starts red.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![CanvasColor::Transparent as u8; (size.width * size.height) as usize],
            brush: CanvasColor::Red,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn brush(&self) -> CanvasColor {
        self.brush
    }

    pub fn set_brush(&mut self, color: CanvasColor) {
        self.brush = color;
    }

    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    pub fn color_at(&self, point: Point) -> CanvasColor {
        if !self.bounding_box().contains(point) {
            return CanvasColor::Transparent;
        }
        let index = point.y as usize * self.size.width as usize + point.x as usize;
        CanvasColor::from_index(self.pixels[index])
    }

    /// Paint a brush square centered on `center` with the current color.
    ///
    /// Returns the painted area after clipping, or `None` when the square
    /// lies entirely outside the canvas.
    pub fn paint(&mut self, center: Point) -> Option<Rectangle> {
        let half = (BRUSH_SIZE / 2) as i32;
        let square = Rectangle::new(center - Point::new(half, half), Size::new_equal(BRUSH_SIZE));
        let area = square.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return None;
        }

        let width = self.size.width as usize;
        for point in area.points() {
            self.pixels[point.y as usize * width + point.x as usize] = self.brush as u8;
        }
        Some(area)
    }

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        self.pixels.fill(CanvasColor::Transparent as u8);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels
            .iter()
            .all(|&index| index == CanvasColor::Transparent as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(canvas: &Canvas) -> usize {
        canvas.bounding_box().points().filter(|p| canvas.color_at(*p) != CanvasColor::Transparent).count()
    }

    #[test]
    fn brush_paints_a_five_by_five_block() {
        let mut canvas = Canvas::new(Size::new(320, 480));
        let area = canvas.paint(Point::new(100, 200)).unwrap();

        assert_eq!(area, Rectangle::new(Point::new(98, 198), Size::new(5, 5)));
        assert_eq!(painted(&canvas), 25);
        assert_eq!(canvas.color_at(Point::new(102, 202)), CanvasColor::Red);
        assert_eq!(canvas.color_at(Point::new(103, 200)), CanvasColor::Transparent);
    }

    #[test]
    fn brush_is_clipped_at_edges() {
        let mut canvas = Canvas::new(Size::new(320, 480));
        canvas.set_brush(CanvasColor::Blue);

        let area = canvas.paint(Point::new(0, 0)).unwrap();
        assert_eq!(area, Rectangle::new(Point::zero(), Size::new(3, 3)));

        let area = canvas.paint(Point::new(319, 479)).unwrap();
        assert_eq!(area, Rectangle::new(Point::new(317, 477), Size::new(3, 3)));

        assert_eq!(canvas.paint(Point::new(-10, 50)), None);
        assert_eq!(painted(&canvas), 18);
    }

    #[test]
    fn clear_erases_everything() {
        let mut canvas = Canvas::new(Size::new(32, 32));
        canvas.paint(Point::new(5, 5));
        canvas.set_brush(CanvasColor::Green);
        canvas.paint(Point::new(20, 20));
        assert!(!canvas.is_blank());

        canvas.clear();
        assert!(canvas.is_blank());
    }

    #[test]
    fn transparent_brush_erases() {
        let mut canvas = Canvas::new(Size::new(32, 32));
        canvas.paint(Point::new(10, 10));
        canvas.set_brush(CanvasColor::Transparent);
        canvas.paint(Point::new(10, 10));
        assert!(canvas.is_blank());
    }

    #[test]
    fn buttons_pick_brush_color() {
        let idle = ControllerState::IDLE;
        assert_eq!(CanvasColor::from_buttons(&idle), None);
        assert_eq!(CanvasColor::from_buttons(&idle.with_button(Button::X)), Some(CanvasColor::Red));
        assert_eq!(CanvasColor::from_buttons(&idle.with_button(Button::A)), Some(CanvasColor::Green));
        assert_eq!(CanvasColor::from_buttons(&idle.with_button(Button::B)), Some(CanvasColor::Blue));
        assert_eq!(CanvasColor::from_buttons(&idle.with_button(Button::Y)), Some(CanvasColor::Transparent));
        assert_eq!(
            CanvasColor::from_buttons(&idle.with_button(Button::X).with_button(Button::B)),
            Some(CanvasColor::Blue)
        );
        assert_eq!(CanvasColor::from_buttons(&idle.with_button(Button::Start)), None);
    }
}

//! Card page: the downloaded card on a white page with a drawing overlay
//!
//! The page is composited per pixel from three layers (white backdrop,
//! card image, annotation canvas), so repainting a brush stroke only
//! touches the stroke's rectangle.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::canvas::{Canvas, CanvasColor};
use crate::image::Bitmap;
use crate::pages::{Page, PageId};
use crate::ui::colors::COLOR_CARD_BACKGROUND;
use crate::ui::core::screen_bounds;

/// Where the card image's top-left corner goes
pub const CARD_ORIGIN: Point = Point::new(0, 16);

pub struct CardPage {
    image: Bitmap,
    canvas: Canvas,
    full_redraw: bool,
    pending: Option<Rectangle>,
}

impl CardPage {
    pub fn new(image: Bitmap) -> Self {
        Self {
            image,
            canvas: Canvas::new(screen_bounds().size),
            full_redraw: true,
            pending: None,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn set_brush(&mut self, color: CanvasColor) {
        self.canvas.set_brush(color);
    }

    /// Paint one brush square at `point`. Returns whether anything was painted.
    pub fn paint(&mut self, point: Point) -> bool {
        let Some(area) = self.canvas.paint(point) else {
            return false;
        };
        self.pending = Some(match self.pending {
            Some(pending) => envelope(pending, area),
            None => area,
        });
        true
    }

    /// Erase every annotation
    pub fn clear_canvas(&mut self) {
        self.canvas.clear();
        self.full_redraw = true;
        self.pending = None;
    }

    /// Composited color of one screen pixel
    pub fn color_at(&self, point: Point) -> Rgb565 {
        self.canvas
            .color_at(point)
            .rgb()
            .or_else(|| self.image.pixel(point - CARD_ORIGIN))
            .unwrap_or(COLOR_CARD_BACKGROUND)
    }

    fn draw_area<D>(&self, area: Rectangle, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.fill_contiguous(&area, area.points().map(|point| self.color_at(point)))
    }
}

/// Smallest rectangle containing both
fn envelope(a: Rectangle, b: Rectangle) -> Rectangle {
    let (Some(a_end), Some(b_end)) = (a.bottom_right(), b.bottom_right()) else {
        return if a.is_zero_sized() { b } else { a };
    };
    let top_left = Point::new(a.top_left.x.min(b.top_left.x), a.top_left.y.min(b.top_left.y));
    let bottom_right = Point::new(a_end.x.max(b_end.x), a_end.y.max(b_end.y));
    Rectangle::with_corners(top_left, bottom_right)
}

impl Page for CardPage {
    fn id(&self) -> PageId {
        PageId::Card
    }

    fn title(&self) -> &str {
        "Card"
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if self.full_redraw {
            self.draw_area(screen_bounds(), display)?;
        } else if let Some(area) = self.pending {
            self.draw_area(area, display)?;
        }
        self.mark_clean();
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.full_redraw || self.pending.is_some()
    }

    fn mark_clean(&mut self) {
        self.full_redraw = false;
        self.pending = None;
    }

    fn mark_dirty(&mut self) {
        self.full_redraw = true;
    }
}

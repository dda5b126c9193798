//! Uniform cell grid with optional divider lines

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

/// A rectangle split into `columns` x `rows` equal cells. Cell edges are
/// computed proportionally so rounding never leaves a gap at the far side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    bounds: Rectangle,
    columns: u32,
    rows: u32,
    divider: Option<Rgb565>,
}

impl GridLayout {
    pub const fn new(bounds: Rectangle, columns: u32, rows: u32) -> Self {
        Self {
            bounds,
            columns,
            rows,
            divider: None,
        }
    }

    pub const fn with_divider(mut self, color: Rgb565) -> Self {
        self.divider = Some(color);
        self
    }

    fn column_edge(&self, column: u32) -> i32 {
        self.bounds.top_left.x + (self.bounds.size.width * column / self.columns.max(1)) as i32
    }

    fn row_edge(&self, row: u32) -> i32 {
        self.bounds.top_left.y + (self.bounds.size.height * row / self.rows.max(1)) as i32
    }

    /// Area of one cell; indices past the grid are clamped to the last cell
    pub fn cell(&self, column: u32, row: u32) -> Rectangle {
        let column = column.min(self.columns.saturating_sub(1));
        let row = row.min(self.rows.saturating_sub(1));
        let (x0, x1) = (self.column_edge(column), self.column_edge(column + 1));
        let (y0, y1) = (self.row_edge(row), self.row_edge(row + 1));
        Rectangle::new(
            Point::new(x0, y0),
            Size::new((x1 - x0) as u32, (y1 - y0) as u32),
        )
    }

    /// Outline and inner dividers, if a divider color is set
    pub fn draw_dividers<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(color) = self.divider else {
            return Ok(());
        };
        let style = PrimitiveStyle::with_stroke(color, 1);
        let top = self.bounds.top_left.y;
        let bottom = top + self.bounds.size.height as i32 - 1;
        let left = self.bounds.top_left.x;
        let right = left + self.bounds.size.width as i32 - 1;

        for column in 0..=self.columns {
            let x = self.column_edge(column).min(right);
            Line::new(Point::new(x, top), Point::new(x, bottom))
                .into_styled(style)
                .draw(display)?;
        }
        for row in 0..=self.rows {
            let y = self.row_edge(row).min(bottom);
            Line::new(Point::new(left, y), Point::new(right, y))
                .into_styled(style)
                .draw(display)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_tile_the_bounds() {
        let grid = GridLayout::new(Rectangle::new(Point::new(33, 342), Size::new(254, 128)), 7, 4);

        assert_eq!(grid.cell(0, 0).top_left, Point::new(33, 342));
        assert_eq!(grid.cell(0, 0).size, Size::new(36, 32));
        let last = grid.cell(6, 3);
        assert_eq!(last.top_left.x + last.size.width as i32, 33 + 254);
        assert_eq!(last.top_left.y + last.size.height as i32, 342 + 128);

        let widths: u32 = (0..7).map(|c| grid.cell(c, 0).size.width).sum();
        assert_eq!(widths, 254);
    }

    #[test]
    fn out_of_range_cells_clamp() {
        let grid = GridLayout::new(Rectangle::new(Point::zero(), Size::new(90, 90)), 3, 3);
        assert_eq!(grid.cell(10, 10), grid.cell(2, 2));
    }
}

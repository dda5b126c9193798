//! PSRAM-backed framebuffer with per-pixel change detection.
//!
//! All page drawing targets this RAM buffer instead of the SPI display.
//! After drawing completes, only the rectangular region containing changed
//! pixels is flushed to the hardware display in a single transfer.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Total number of pixels in the framebuffer (320 x 480 = 153,600).
const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// A drawing surface whose content becomes visible on [`present`].
///
/// [`present`]: DisplaySurface::present
pub trait DisplaySurface: DrawTarget<Color = Rgb565> {
    /// Push everything drawn since the last call to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Create a new dirty rect covering a single pixel.
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// PSRAM-backed framebuffer implementing `DrawTarget<Color = Rgb565>`.
///
/// Heap-allocates a 320x480x2 = 307,200-byte pixel buffer. Tracks a dirty
/// bounding box so that only changed pixels are flushed to the hardware
/// display.
pub struct FrameBuffer {
    pixels: Vec<Rgb565>,
    dirty: Option<DirtyRect>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Allocate a new framebuffer filled with black pixels.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; PIXEL_COUNT],
            dirty: None,
        }
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * WIDTH + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Color at `point`, or `None` off-screen
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        if point.x < 0 || point.y < 0 || point.x as usize >= WIDTH || point.y as usize >= HEIGHT {
            return None;
        }
        Some(self.pixels[point.y as usize * WIDTH + point.x as usize])
    }

    /// Return and reset the changed area without flushing it anywhere.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take().map(DirtyRect::to_rectangle)
    }

    /// Flush the dirty region to a hardware display, then reset the dirty state.
    ///
    /// Only the bounding rectangle of changed pixels is sent via
    /// `fill_contiguous`. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(area) = self.take_dirty() else {
            return Ok(());
        };

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, area.top_left.x, area.top_left.y
        );

        // Borrow the pixel slice so the closure captures a shared reference,
        // avoiding the `FnMut` escaping-reference issue with `&mut self`.
        let pixels = &self.pixels;
        let (min_x, min_y) = (area.top_left.x as usize, area.top_left.y as usize);
        let width = area.size.width as usize;
        let rows = min_y..min_y + area.size.height as usize;
        let pixel_iter = rows.flat_map(move |y| {
            let row_start = y * WIDTH + min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl DisplaySurface for FrameBuffer {
    /// A bare framebuffer has no panel behind it; changes stay tracked
    /// until [`FrameBuffer::flush`] or [`FrameBuffer::take_dirty`].
    fn present(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // Colors are laid out over the unclipped area; skip the ones that
        // fall off-screen.
        for (point, color) in area.points().zip(colors) {
            let (x, y) = (point.x, point.y);
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };

        for y in clipped.top_left.y as usize..=bottom_right.y as usize {
            for x in clipped.top_left.x as usize..=bottom_right.x as usize {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

/// A framebuffer in front of a hardware panel. Drawing lands in RAM and
/// [`DisplaySurface::present`] flushes the changed area.
pub struct BufferedDisplay<P> {
    buffer: FrameBuffer,
    panel: P,
}

impl<P> BufferedDisplay<P>
where
    P: DrawTarget<Color = Rgb565>,
{
    pub fn new(panel: P) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            panel,
        }
    }
}

impl<P> OriginDimensions for BufferedDisplay<P> {
    fn size(&self) -> Size {
        self.buffer.size()
    }
}

impl<P> DrawTarget for BufferedDisplay<P>
where
    P: DrawTarget<Color = Rgb565>,
{
    type Color = Rgb565;
    type Error = P::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let Ok(()) = self.buffer.draw_iter(pixels);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let Ok(()) = self.buffer.fill_contiguous(area, colors);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let Ok(()) = self.buffer.fill_solid(area, color);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let Ok(()) = self.buffer.clear(color);
        Ok(())
    }
}

impl<P> DisplaySurface for BufferedDisplay<P>
where
    P: DrawTarget<Color = Rgb565>,
{
    fn present(&mut self) -> Result<(), Self::Error> {
        self.buffer.flush(&mut self.panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    /// Panel double that records the areas it was asked to fill
    #[derive(Default)]
    struct RecordingPanel {
        fills: Vec<(Rectangle, usize)>,
    }

    impl OriginDimensions for RecordingPanel {
        fn size(&self) -> Size {
            Size::new(WIDTH as u32, HEIGHT as u32)
        }
    }

    impl DrawTarget for RecordingPanel {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            self.fills.push((*area, colors.into_iter().count()));
            Ok(())
        }
    }

    #[test]
    fn unchanged_pixels_do_not_dirty() {
        let mut fb = FrameBuffer::new();
        fb.clear(Rgb565::BLACK).unwrap();
        assert_eq!(fb.take_dirty(), None);
    }

    #[test]
    fn dirty_rect_bounds_changes() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(10, 20), Rgb565::RED).draw(&mut fb).unwrap();
        Pixel(Point::new(30, 5), Rgb565::RED).draw(&mut fb).unwrap();
        Pixel(Point::new(-1, 500), Rgb565::RED).draw(&mut fb).unwrap();

        assert_eq!(
            fb.take_dirty(),
            Some(Rectangle::new(Point::new(10, 5), Size::new(21, 16)))
        );
        assert_eq!(fb.take_dirty(), None);
    }

    #[test]
    fn fill_contiguous_clips_without_shifting() {
        let mut fb = FrameBuffer::new();
        let area = Rectangle::new(Point::new(-1, 0), Size::new(2, 1));
        fb.fill_contiguous(&area, [Rgb565::RED, Rgb565::GREEN]).unwrap();
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::GREEN));
    }

    #[test]
    fn fill_solid_clips_to_screen() {
        let mut fb = FrameBuffer::new();
        Rectangle::new(Point::new(310, 470), Size::new(50, 50))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(Point::new(319, 479)), Some(Rgb565::BLUE));
        assert_eq!(
            fb.take_dirty(),
            Some(Rectangle::new(Point::new(310, 470), Size::new(10, 10)))
        );
    }

    #[test]
    fn present_flushes_only_the_changed_area() {
        let mut display = BufferedDisplay::new(RecordingPanel::default());
        Rectangle::new(Point::new(5, 5), Size::new(4, 3))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(&mut display)
            .unwrap();

        display.present().unwrap();
        display.present().unwrap();

        assert_eq!(
            display.panel.fills,
            [(Rectangle::new(Point::new(5, 5), Size::new(4, 3)), 12)]
        );
    }
}

//! Resistive touch input and raw-to-display calibration

use embedded_graphics::prelude::*;

/// Raw 12-bit reading from the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTouch {
    pub x: u16,
    pub y: u16,
    pub pressure: u16,
}

impl RawTouch {
    pub fn new(x: u16, y: u16, pressure: u16) -> Self {
        Self { x, y, pressure }
    }
}

/// Source of touch samples. `Ok(None)` means nothing is touching the panel.
#[allow(async_fn_in_trait)]
pub trait TouchPanel {
    type Error: core::fmt::Debug;

    async fn read(&mut self) -> Result<Option<RawTouch>, Self::Error>;
}

/// Linear mapping from raw controller units to display pixels.
///
/// Each axis maps `raw_min..raw_min + raw_span` onto `0..output_span`,
/// truncating toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub x_min: i32,
    pub x_span: i32,
    pub x_output: i32,
    pub y_min: i32,
    pub y_span: i32,
    pub y_output: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            x_min: 300,
            x_span: 3400,
            x_output: 310,
            y_min: 250,
            y_span: 3600,
            y_output: 470,
        }
    }
}

impl Calibration {
    /// Map a raw sample to display coordinates without bounds checks.
    /// Readings below the calibrated minimum map to negative coordinates.
    pub fn map(&self, raw: RawTouch) -> Point {
        Point::new(
            scale(raw.x, self.x_min, self.x_span, self.x_output),
            scale(raw.y, self.y_min, self.y_span, self.y_output),
        )
    }

    /// Map a raw sample and drop it if it lands past the right or bottom
    /// edge of a display of `size`.
    pub fn map_within(&self, raw: RawTouch, size: Size) -> Option<Point> {
        let point = self.map(raw);
        (point.x < size.width as i32 && point.y < size.height as i32).then_some(point)
    }
}

fn scale(raw: u16, min: i32, span: i32, output: i32) -> i32 {
    if span == 0 {
        return 0;
    }
    (raw as i32 - min) * output / span
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Size = Size::new(320, 480);

    #[test]
    fn calibrated_minimum_maps_to_origin() {
        let cal = Calibration::default();
        assert_eq!(cal.map(RawTouch::new(300, 250, 500)), Point::zero());
    }

    #[test]
    fn mapping_truncates() {
        let cal = Calibration::default();
        // (1397 - 300) * 310 / 3400 = 100.02, (1782 - 250) * 470 / 3600 = 200.01
        assert_eq!(cal.map(RawTouch::new(1397, 1782, 500)), Point::new(100, 200));
        // (1396 - 300) * 310 / 3400 = 99.93
        assert_eq!(cal.map(RawTouch::new(1396, 1782, 500)).x, 99);
    }

    #[test]
    fn points_below_minimum_go_negative_but_are_kept() {
        let cal = Calibration::default();
        let point = cal.map_within(RawTouch::new(100, 100, 500), DISPLAY);
        assert_eq!(point, Some(Point::new(-18, -19)));
    }

    #[test]
    fn points_past_far_edges_are_dropped() {
        let cal = Calibration::default();
        assert_eq!(cal.map_within(RawTouch::new(4095, 1000, 500), DISPLAY), None);
        // (3926 - 250) * 470 / 3600 = 479.9, (3927 - 250) * 470 / 3600 = 480.05
        assert_eq!(
            cal.map_within(RawTouch::new(1000, 3926, 500), DISPLAY),
            Some(Point::new(63, 479))
        );
        assert_eq!(cal.map_within(RawTouch::new(1000, 3927, 500), DISPLAY), None);
    }
}

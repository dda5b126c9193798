//! Card image decoding and nearest-neighbour resampling
//!
//! Downloaded images are PNG, BMP or GIF (first frame only). All are decoded
//! into an owned RGB565 [`Bitmap`] which the card page then stretches to
//! [`CARD_SIZE`].

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;
use thiserror_no_std::Error;

/// Size every card image is stretched to
pub const CARD_SIZE: Size = Size::new(320, 448);

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const BMP_MAGIC: &[u8] = b"BM";
const GIF_MAGIC: &[u8] = b"GIF8";

/// Refuse anything that would need more than this many pixels
pub const MAX_SOURCE_PIXELS: u32 = 1024 * 1024;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("invalid PNG data")]
    Png,
    #[error("invalid BMP data")]
    Bmp,
    #[error("invalid GIF data")]
    Gif,
    #[error("image has zero width or height")]
    Empty,
    #[error("image is {0}x{1}, too large to decode")]
    TooLarge(u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Bmp,
    Gif,
}

impl ImageFormat {
    /// Sniff the format from the leading magic bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(BMP_MAGIC) {
            Some(ImageFormat::Bmp)
        } else if bytes.starts_with(GIF_MAGIC) {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }
}

/// Owned RGB565 image, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: Size,
    pixels: Vec<Rgb565>,
}

impl Bitmap {
    pub fn new(size: Size, fill: Rgb565) -> Self {
        Self {
            size,
            pixels: vec![fill; (size.width * size.height) as usize],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    /// Pixel at `point`, or `None` outside the bitmap
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.index(point).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, point: Point, color: Rgb565) {
        if let Some(i) = self.index(point) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (width, height) = (self.size.width as i32, self.size.height as i32);
        if point.x < 0 || point.y < 0 || point.x >= width || point.y >= height {
            return None;
        }
        Some((point.y * width + point.x) as usize)
    }

    /// Draw the whole bitmap with its top-left corner at `origin`.
    pub fn draw_at<D>(&self, origin: Point, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = Rectangle::new(origin, self.size);
        display.fill_contiguous(&area, self.pixels.iter().copied())
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Bitmap {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }
}

/// Decode PNG, BMP or GIF bytes into a bitmap.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    match ImageFormat::detect(bytes) {
        Some(ImageFormat::Png) => decode_png(bytes),
        Some(ImageFormat::Bmp) => decode_bmp(bytes),
        Some(ImageFormat::Gif) => decode_gif(bytes),
        None => Err(DecodeError::UnknownFormat),
    }
}

fn check_size(width: u32, height: u32) -> Result<Size, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty);
    }
    if width.saturating_mul(height) > MAX_SOURCE_PIXELS {
        return Err(DecodeError::TooLarge(width, height));
    }
    Ok(Size::new(width, height))
}

fn decode_png(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    let header = minipng::decode_png_header(bytes).map_err(|_| DecodeError::Png)?;
    let size = check_size(header.width(), header.height())?;

    let mut buffer = vec![0; header.required_bytes_rgba8bpc()];
    let mut image = minipng::decode_png(bytes, &mut buffer).map_err(|_| DecodeError::Png)?;
    image.convert_to_rgba8bpc().map_err(|_| DecodeError::Png)?;

    // Transparent areas (rounded card corners) blend to the white page
    let pixels = image
        .pixels()
        .chunks_exact(4)
        .map(|rgba| {
            if rgba[3] < 0x80 {
                Rgb565::WHITE
            } else {
                Rgb565::from(Rgb888::new(rgba[0], rgba[1], rgba[2]))
            }
        })
        .collect();

    debug!("Decoded PNG {}x{}", size.width, size.height);
    Ok(Bitmap { size, pixels })
}

fn decode_bmp(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    let bmp = tinybmp::Bmp::<Rgb565>::from_slice(bytes).map_err(|_| DecodeError::Bmp)?;
    let bmp_size = bmp.size();
    let size = check_size(bmp_size.width, bmp_size.height)?;

    let mut bitmap = Bitmap::new(size, Rgb565::BLACK);
    for Pixel(point, color) in bmp.pixels() {
        bitmap.set_pixel(point, color);
    }

    debug!("Decoded BMP {}x{}", size.width, size.height);
    Ok(bitmap)
}

fn decode_gif(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    // Logical screen size follows the 6-byte signature
    let Some(&[w0, w1, h0, h1]) = bytes.get(6..10) else {
        return Err(DecodeError::Gif);
    };
    let size = check_size(
        u16::from_le_bytes([w0, w1]).into(),
        u16::from_le_bytes([h0, h1]).into(),
    )?;

    let gif = tinygif::Gif::<Rgb565>::from_slice(bytes).map_err(|_| DecodeError::Gif)?;
    let frame = gif.frames().next().ok_or(DecodeError::Gif)?;

    // Transparent pixels are skipped, leaving the white page behind them
    let mut bitmap = Bitmap::new(size, Rgb565::WHITE);
    if let Err(never) = frame.draw(&mut bitmap) {
        match never {}
    }

    debug!("Decoded GIF {}x{}", size.width, size.height);
    Ok(bitmap)
}

/// Source coordinate sampled for output coordinate `out` when mapping
/// `in_len` pixels onto `out_len`, rounding half up.
pub fn source_coord(out: u32, out_len: u32, in_len: u32) -> u32 {
    if out_len <= 1 || in_len <= 1 {
        return 0;
    }
    let numerator = 2 * out as u64 * (in_len as u64 - 1) + (out_len as u64 - 1);
    let denominator = 2 * (out_len as u64 - 1);
    ((numerator / denominator) as u32).min(in_len - 1)
}

/// Stretch `source` to `target` with nearest-neighbour sampling.
/// `on_row` is called after each output row with the finished row index.
/// An empty source yields a black target.
pub fn resample(source: &Bitmap, target: Size, mut on_row: impl FnMut(u32)) -> Bitmap {
    let src = source.size();
    if src.width == 0 || src.height == 0 {
        return Bitmap::new(target, Rgb565::BLACK);
    }
    let columns: Vec<u32> = (0..target.width)
        .map(|x| source_coord(x, target.width, src.width))
        .collect();

    let mut pixels = Vec::with_capacity((target.width * target.height) as usize);
    for y in 0..target.height {
        let row_start = (source_coord(y, target.height, src.height) * src.width) as usize;
        pixels.extend(columns.iter().map(|&x| source.pixels[row_start + x as usize]));
        on_row(y);
    }

    Bitmap {
        size: target,
        pixels,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 2x2 RGBA PNG: red, green / blue, transparent
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x02, 0x08, 0x06, 0x00, 0x00, 0x00, 0x72,
        0xb6, 0x0d, 0x24, 0x00, 0x00, 0x00, 0x13, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
        0xcf, 0xc0, 0xf0, 0x1f, 0x0c, 0x81, 0x34, 0x88, 0x60, 0x00, 0x00, 0x3f, 0xd2, 0x05, 0xfb,
        0xcb, 0x17, 0xa6, 0xce, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60,
        0x82,
    ];

    /// 2x1 GIF: red, blue
    const TINY_GIF: &[u8] = &[
        b'G', b'I', b'F', b'8', b'9', b'a', 0x02, 0x00, 0x01, 0x00, 0x81, 0x00, 0x00, // header
        0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, // palette
        0x2c, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, // image descriptor
        0x02, 0x02, 0x8c, 0x0a, 0x00, // LZW data
        0x3b,
    ];

    /// Uncompressed 24-bit BMP filled with one color
    pub(crate) fn solid_bmp(width: u32, height: u32, rgb: (u8, u8, u8)) -> Vec<u8> {
        let row_len = (width * 3).div_ceil(4) * 4;
        let image_len = row_len * height;
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(54 + image_len).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&54u32.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        out.extend_from_slice(&(height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&image_len.to_le_bytes());
        out.extend_from_slice(&2835u32.to_le_bytes());
        out.extend_from_slice(&2835u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for _ in 0..height {
            for _ in 0..width {
                out.extend_from_slice(&[rgb.2, rgb.1, rgb.0]);
            }
            out.resize(out.len() + (row_len - width * 3) as usize, 0);
        }
        out
    }

    fn gradient(size: Size) -> Bitmap {
        let mut bitmap = Bitmap::new(size, Rgb565::BLACK);
        for y in 0..size.height as i32 {
            for x in 0..size.width as i32 {
                bitmap.set_pixel(Point::new(x, y), Rgb565::new(x as u8 % 32, y as u8 % 64, 0));
            }
        }
        bitmap
    }

    #[test]
    fn detects_formats() {
        assert_eq!(ImageFormat::detect(TINY_PNG), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"BM...."), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::detect(TINY_GIF), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::detect(&[0xff, 0xd8, 0xff]), None);
        assert_eq!(decode(b"<html>down</html>"), Err(DecodeError::UnknownFormat));
    }

    #[test]
    fn decodes_png_with_transparency() {
        let bitmap = decode(TINY_PNG).unwrap();
        assert_eq!(bitmap.size(), Size::new(2, 2));
        assert_eq!(bitmap.pixel(Point::new(0, 0)), Some(Rgb565::RED));
        assert_eq!(bitmap.pixel(Point::new(1, 0)), Some(Rgb565::GREEN));
        assert_eq!(bitmap.pixel(Point::new(0, 1)), Some(Rgb565::BLUE));
        assert_eq!(bitmap.pixel(Point::new(1, 1)), Some(Rgb565::WHITE));
    }

    #[test]
    fn decodes_bmp() {
        let bitmap = decode(&solid_bmp(3, 2, (255, 0, 0))).unwrap();
        assert_eq!(bitmap.size(), Size::new(3, 2));
        assert!(bitmap.pixels().iter().all(|&c| c == Rgb565::RED));
    }

    #[test]
    fn decodes_first_gif_frame() {
        let bitmap = decode(TINY_GIF).unwrap();
        assert_eq!(bitmap.size(), Size::new(2, 1));
        assert_eq!(bitmap.pixels(), [Rgb565::RED, Rgb565::BLUE]);
    }

    #[test]
    fn truncated_images_fail() {
        assert_eq!(decode(&TINY_PNG[..40]), Err(DecodeError::Png));
        assert_eq!(decode(&TINY_GIF[..8]), Err(DecodeError::Gif));
        assert_eq!(decode(&solid_bmp(3, 2, (0, 0, 0))[..20]), Err(DecodeError::Bmp));
    }

    #[test]
    fn source_coordinates_round_half_up() {
        // 3 -> 5: 0, 0.5, 1, 1.5, 2
        let coords: Vec<u32> = (0..5).map(|o| source_coord(o, 5, 3)).collect();
        assert_eq!(coords, [0, 1, 1, 2, 2]);
        assert_eq!(source_coord(447, 448, 680), 679);
        assert_eq!(source_coord(0, 1, 10), 0);
        assert_eq!(source_coord(5, 10, 1), 0);
    }

    #[test]
    fn equal_size_resample_is_identity() {
        let source = gradient(Size::new(17, 9));
        let mut rows = 0;
        let out = resample(&source, source.size(), |_| rows += 1);
        assert_eq!(out, source);
        assert_eq!(rows, 9);
    }

    #[test]
    fn resample_always_hits_target_size() {
        for size in [Size::new(1, 1), Size::new(488, 680), Size::new(223, 310)] {
            let out = resample(&Bitmap::new(size, Rgb565::CYAN), CARD_SIZE, |_| {});
            assert_eq!(out.size(), CARD_SIZE);
            assert_eq!(out.pixels().len(), (320 * 448) as usize);
        }
    }

    #[test]
    fn empty_source_resamples_to_black() {
        for size in [Size::new(0, 10), Size::new(10, 0), Size::zero()] {
            let mut rows = 0;
            let out = resample(&Bitmap::new(size, Rgb565::CYAN), Size::new(4, 3), |_| rows += 1);
            assert_eq!(out, Bitmap::new(Size::new(4, 3), Rgb565::BLACK));
            assert_eq!(rows, 0);
        }
    }

    #[test]
    fn resample_maps_corners_to_corners() {
        let source = gradient(Size::new(40, 60));
        let out = resample(&source, CARD_SIZE, |_| {});
        assert_eq!(out.pixel(Point::zero()), source.pixel(Point::zero()));
        assert_eq!(out.pixel(Point::new(319, 447)), source.pixel(Point::new(39, 59)));
    }
}

//! Frame buffer the widgets render into.
//!
//! The canvas is a fixed 320x480 RGB888 grid implementing the
//! embedded-graphics `DrawTarget`, so widgets draw with ordinary primitives
//! and fonts. Rectangular sub-views are extracted as [`Region`]s already
//! converted to the panel's packed pixel format.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;

use crate::proto::pixel;
use crate::{Error, Result, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Rectangle in display coordinates. `width`/`height` are never zero for a
/// validated rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-display rectangle.
    pub fn full_frame() -> Self {
        Self::new(0, 0, DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u16 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u16 {
        self.y + self.height
    }

    /// Bounding rectangle of two rects.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Gap between the rects along one axis, zero when they touch or
    /// overlap. Used by the compositor's region merge.
    pub fn gap_x(&self, other: &Rect) -> u16 {
        if self.x > other.right() {
            self.x - other.right()
        } else if other.x > self.right() {
            other.x - self.right()
        } else {
            0
        }
    }

    pub fn gap_y(&self, other: &Rect) -> u16 {
        if self.y > other.bottom() {
            self.y - other.bottom()
        } else if other.y > self.bottom() {
            other.y - self.bottom()
        } else {
            0
        }
    }

    /// Reject empty or out-of-display rectangles.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "empty region {}x{} at ({},{})",
                self.width, self.height, self.x, self.y
            )));
        }
        if self.right() > DISPLAY_WIDTH || self.bottom() > DISPLAY_HEIGHT {
            return Err(Error::Config(format!(
                "region ({},{}) {}x{} exceeds {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}",
                self.x, self.y, self.width, self.height
            )));
        }
        Ok(())
    }

    /// embedded-graphics view of this rect, for clipped widget drawing.
    pub fn to_eg(&self) -> Rectangle {
        Rectangle::new(
            Point::new(i32::from(self.x), i32::from(self.y)),
            Size::new(u32::from(self.width), u32::from(self.height)),
        )
    }
}

/// Rectangular slice of the frame in wire format: RGB565, little-endian,
/// row-major. The unit of transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl Region {
    /// Solid single-color region; used by diagnostics (test fills).
    pub fn solid(rect: Rect, color: Rgb888) -> Result<Self> {
        rect.validate()?;
        let count = usize::from(rect.width) * usize::from(rect.height);
        let mut pixels = Vec::with_capacity(count * 2);
        for _ in 0..count {
            pixel::push_le(&mut pixels, color);
        }
        Ok(Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            pixels,
        })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_full_frame(&self) -> bool {
        self.x == 0 && self.y == 0 && self.width == DISPLAY_WIDTH && self.height == DISPLAY_HEIGHT
    }
}

/// The 320x480 frame. Dimensions never change at runtime.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    pixels: Vec<Rgb888>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb888::BLACK; Self::len()],
        }
    }

    fn len() -> usize {
        usize::from(DISPLAY_WIDTH) * usize::from(DISPLAY_HEIGHT)
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Fill one rectangle; out-of-display parts are ignored.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb888) {
        let right = rect.right().min(DISPLAY_WIDTH);
        let bottom = rect.bottom().min(DISPLAY_HEIGHT);
        for y in rect.y..bottom {
            let row = usize::from(y) * usize::from(DISPLAY_WIDTH);
            for x in rect.x..right {
                self.pixels[row + usize::from(x)] = color;
            }
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb888> {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return None;
        }
        Some(self.pixels[usize::from(y) * usize::from(DISPLAY_WIDTH) + usize::from(x)])
    }

    /// Extract a rectangle as a wire-format region.
    pub fn extract(&self, rect: Rect) -> Result<Region> {
        rect.validate()?;
        let mut pixels =
            Vec::with_capacity(usize::from(rect.width) * usize::from(rect.height) * 2);
        for y in rect.y..rect.bottom() {
            let row = usize::from(y) * usize::from(DISPLAY_WIDTH);
            for x in rect.x..rect.right() {
                pixel::push_le(&mut pixels, self.pixels[row + usize::from(x)]);
            }
        }
        Ok(Region {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            pixels,
        })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(u32::from(DISPLAY_WIDTH), u32::from(DISPLAY_HEIGHT))
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0
                || point.y < 0
                || point.x >= i32::from(DISPLAY_WIDTH)
                || point.y >= i32::from(DISPLAY_HEIGHT)
            {
                continue;
            }
            let idx =
                point.y as usize * usize::from(DISPLAY_WIDTH) + point.x as usize;
            self.pixels[idx] = color;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_converts_to_packed_little_endian() {
        let mut canvas = Canvas::new();
        canvas.fill_rect(Rect::new(0, 0, 2, 1), Rgb888::new(255, 0, 0));
        let region = canvas.extract(Rect::new(0, 0, 2, 1)).unwrap();
        assert_eq!(region.pixels, [0x00, 0xF8, 0x00, 0xF8]);
    }

    #[test]
    fn region_payload_length_matches_dimensions() {
        let canvas = Canvas::new();
        let region = canvas.extract(Rect::new(10, 20, 30, 40)).unwrap();
        assert_eq!(region.pixels.len(), 30 * 40 * 2);
        assert!(!region.is_full_frame());

        let full = canvas.extract(Rect::full_frame()).unwrap();
        assert!(full.is_full_frame());
        assert_eq!(full.pixels.len(), 320 * 480 * 2);
    }

    #[test]
    fn extract_rejects_out_of_bounds() {
        let canvas = Canvas::new();
        assert!(canvas.extract(Rect::new(300, 0, 21, 10)).is_err());
        assert!(canvas.extract(Rect::new(0, 470, 10, 11)).is_err());
        assert!(canvas.extract(Rect::new(0, 0, 0, 10)).is_err());
    }

    #[test]
    fn rect_union_and_gaps() {
        let a = Rect::new(0, 0, 50, 20);
        let b = Rect::new(52, 2, 50, 20);
        assert_eq!(a.gap_x(&b), 2);
        assert_eq!(a.gap_y(&b), 0);
        assert_eq!(a.union(&b), Rect::new(0, 0, 102, 22));

        let c = Rect::new(0, 100, 10, 10);
        assert_eq!(a.gap_y(&c), 80);
    }

    #[test]
    fn solid_region_is_uniform() {
        let region = Region::solid(Rect::new(0, 0, 4, 4), Rgb888::new(0, 0, 255)).unwrap();
        assert_eq!(region.pixels.len(), 32);
        assert!(region.pixels.chunks(2).all(|px| px == [0x1F, 0x00]));
    }

    #[test]
    fn draw_target_clips_out_of_bounds_pixels() {
        let mut canvas = Canvas::new();
        let white = Rgb888::WHITE;
        canvas
            .draw_iter([
                Pixel(Point::new(-1, 0), white),
                Pixel(Point::new(0, 0), white),
                Pixel(Point::new(320, 479), white),
            ])
            .unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(white));
        assert_eq!(canvas.pixel(319, 479), Some(Rgb888::BLACK));
    }
}

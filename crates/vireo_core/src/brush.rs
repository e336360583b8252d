//! Brushes: how a paint operation fills the current clip

use std::sync::Arc;

use crate::color::Color;
use crate::geometry::Point;

/// Handle to an image registered with a frame buffer's image arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(u32);

impl ImageId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// RGBA8 pixel data referenced by [`Brush::Image`].
///
/// Pixels are sRGB-encoded, row-major, 4 bytes per pixel. Shared cheaply
/// between the recording buffer and whoever consumes the finalized stream.
#[derive(Clone, Debug)]
pub struct ImageSource {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl ImageSource {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Pixel at integer coordinates. Out-of-bounds reads are transparent.
    pub fn pixel(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Color::TRANSPARENT;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let px = &self.pixels[idx..idx + 4];
        Color::from_rgba8(px[0], px[1], px[2], px[3])
    }
}

/// A two-stop linear gradient.
///
/// Colors between the stops are interpolated in linear space, then
/// re-encoded to sRGB; points beyond either stop clamp to that stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub from: Color,
    pub to: Color,
}

impl LinearGradient {
    pub const fn new(start: Point, end: Point, from: Color, to: Color) -> Self {
        Self {
            start,
            end,
            from,
            to,
        }
    }

    /// Sample the gradient at a point by projecting onto the start→end axis.
    pub fn sample(&self, p: Point) -> Color {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f32::EPSILON {
            return self.from;
        }
        let t = ((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len_sq;
        // At or beyond a stop, return it exactly; the linear round-trip is
        // not bit-exact.
        if t <= 0.0 {
            return self.from;
        }
        if t >= 1.0 {
            return self.to;
        }
        Color::lerp_linear(self.from, self.to, t)
    }
}

/// Fill source for a paint operation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Brush {
    Solid(Color),
    LinearGradient(LinearGradient),
    Image(ImageId),
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Brush::Solid(color)
    }
}

impl From<LinearGradient> for Brush {
    fn from(gradient: LinearGradient) -> Self {
        Brush::LinearGradient(gradient)
    }
}

impl From<ImageId> for Brush {
    fn from(image: ImageId) -> Self {
        Brush::Image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_midpoint_is_linear_space_mix() {
        let g = LinearGradient::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Color::BLACK,
            Color::WHITE,
        );
        let mid = g.sample(Point::new(50.0, 7.0));
        assert_eq!(mid, Color::lerp_linear(Color::BLACK, Color::WHITE, 0.5));
        // And explicitly not the naive sRGB average.
        assert!(mid.r > 0.6);
    }

    #[test]
    fn gradient_clamps_outside_stops() {
        let g = LinearGradient::new(
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Color::RED,
            Color::BLUE,
        );
        assert_eq!(g.sample(Point::new(-5.0, 0.0)), Color::RED);
        assert_eq!(g.sample(Point::new(99.0, 0.0)), Color::BLUE);
        // Sampling exactly at a stop is bit-exact, not a lossy round-trip.
        assert_eq!(g.sample(Point::new(10.0, 0.0)), Color::RED);
        assert_eq!(g.sample(Point::new(20.0, 0.0)), Color::BLUE);
    }

    #[test]
    fn image_out_of_bounds_is_transparent() {
        let img = ImageSource::new(2, 2, vec![255; 16]);
        assert_eq!(img.pixel(5, 0), Color::TRANSPARENT);
        assert_eq!(img.pixel(-1, 0), Color::TRANSPARENT);
        assert_eq!(img.pixel(1, 1), Color::WHITE);
    }
}

//! Headless frame evaluation
//!
//! Renders a flattened [`FrameStream`] to a CPU pixmap by point-sampling
//! pixel centers, with linear-space source-over compositing. This is not a
//! production rasterizer — it exists so tests can assert per-pixel
//! expectations against the recording layer without a GPU.

use vireo_core::{Brush, Color, LinearColor, Point};
use vireo_ops::{FrameStream, ResolvedPaint};

/// Raw RGBA8 render target for captured frames.
#[derive(Clone, Debug)]
pub struct Pixmap {
    /// Raw pixel data (RGBA8, sRGB-encoded)
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    /// Get a pixel at (x, y) as RGBA.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Assert the pixel at (x, y) matches `expected` within a small
    /// per-channel tolerance.
    ///
    /// # Panics
    ///
    /// Panics with the actual and expected values when they differ, so
    /// test failures read like the render-test expectations they are.
    #[track_caller]
    pub fn expect(&self, x: u32, y: u32, expected: Color) {
        const TOLERANCE: i32 = 2;
        let actual = self
            .get_pixel(x, y)
            .unwrap_or_else(|| panic!("pixel ({x}, {y}) out of bounds"));
        let want = expected.to_rgba8();
        // A fully transparent pixel matches regardless of its color
        // channels.
        if want[3] == 0 && actual[3] == 0 {
            return;
        }
        let ok = actual
            .iter()
            .zip(want.iter())
            .all(|(a, w)| (*a as i32 - *w as i32).abs() <= TOLERANCE);
        assert!(
            ok,
            "pixel ({x}, {y}): got {actual:?}, expected {want:?}"
        );
    }

    fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }
}

/// Color a single paint record contributes at a root-space point, or
/// `None` when the point is clipped out.
fn paint_color_at(stream: &FrameStream, paint: &ResolvedPaint, root: Point) -> Option<Color> {
    if !paint.covers(root) {
        return None;
    }
    let color = match paint.brush {
        Brush::Solid(color) => color,
        Brush::LinearGradient(gradient) => gradient.sample(paint.to_local(root)),
        Brush::Image(id) => {
            let local = paint.to_local(root);
            stream
                .image(id)
                .map(|img| img.pixel(local.x.floor() as i32, local.y.floor() as i32))
                .unwrap_or(Color::TRANSPARENT)
        }
    };
    Some(color)
}

/// Composite color of the frame at a root-space point, over a transparent
/// background.
pub fn sample(stream: &FrameStream, point: Point) -> Color {
    let mut dst = LinearColor::TRANSPARENT;
    for paint in &stream.paints {
        if let Some(src) = paint_color_at(stream, paint, point) {
            dst = dst.over(src.to_linear());
        }
    }
    dst.to_srgb()
}

/// Render the stream into a pixmap by sampling every pixel center.
pub fn render(stream: &FrameStream, width: u32, height: u32) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            pixmap.put_pixel(x, y, sample(stream, p).to_rgba8());
        }
    }
    tracing::trace!(width, height, paints = stream.paints.len(), "probe render");
    pixmap
}

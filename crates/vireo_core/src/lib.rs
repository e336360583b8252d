//! Vireo core primitives
//!
//! Shared foundation types for the frame recording and caching layer:
//!
//! - **Geometry**: points, rects, rounded rects, ellipses with containment tests
//! - **Transforms**: 2D affine transforms with composition and inversion
//! - **Color**: sRGB-encoded color with exact linear-space conversion
//! - **Paths**: vector paths with content hashing for cache keys
//! - **Brushes**: solid, linear-gradient, and image fills

pub mod brush;
pub mod color;
pub mod geometry;
pub mod path;
pub mod transform;

pub use brush::{Brush, ImageId, ImageSource, LinearGradient};
pub use color::{Color, LinearColor};
pub use geometry::{CornerRadius, Ellipse, Point, Rect, RoundedRect, Size};
pub use path::{Path, PathBuilder, PathCommand};
pub use transform::Transform;

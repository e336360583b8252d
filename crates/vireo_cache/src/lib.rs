//! Vireo geometry and shaping caches
//!
//! Process-lifetime memoization for the expensive work behind the frame
//! recorder: path tessellation, text shaping, and glyph outline extraction.
//! Three independently-instantiated caches share one policy
//! ([`GeometryCache`]): fixed capacity, strict least-recently-used
//! eviction, recency refreshed by both `get` and `put`.
//!
//! Caches outlive frames. Eviction is driven solely by access recency,
//! never by what is currently visible, so geometry computed for offscreen
//! content stays retrievable when it scrolls back into view.
//!
//! Ownership is explicit: construct the caches wherever the recording
//! layer is constructed and pass them down; there are no global
//! singletons.

pub mod policy;
pub mod stencil;
pub mod text;

pub use policy::{CacheStats, GeometryCache};
pub use stencil::{PathKey, Stencil, StencilCache, StencilVertex, DEFAULT_STENCIL_CAPACITY};
pub use text::{
    glyph_outline_cache, layout_cache, GlyphKey, GlyphOutlineCache, LayoutCache, LayoutKey,
    PositionedGlyph, TextLayout, WrapMode, DEFAULT_GLYPH_CAPACITY, DEFAULT_LAYOUT_CAPACITY,
};

use thiserror::Error;

/// Cache-side failures. Misses are not errors; this covers the artifact
/// computation a miss triggers.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("path tessellation failed: {0}")]
    Tessellation(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

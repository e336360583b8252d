//! Text layout and glyph outline caches
//!
//! The shaper and font parser live outside this crate; these caches store
//! their finished artifacts. Keys carry every shaping input (text, font,
//! size, wrapping) as bit patterns so lookups are exact.

use std::num::NonZeroUsize;

use vireo_core::{Path, Size};

use crate::policy::GeometryCache;

/// Default text-layout cache capacity, in entries.
pub const DEFAULT_LAYOUT_CAPACITY: usize = 1024;

/// Default glyph-outline cache capacity, in entries.
pub const DEFAULT_GLYPH_CAPACITY: usize = 2048;

/// Line wrapping mode, part of the shaping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Word,
    Character,
    None,
}

/// Shaping parameters identifying one text layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    pub text: String,
    pub font_id: u32,
    size_bits: u32,
    max_width_bits: Option<u32>,
    pub wrap: WrapMode,
}

impl LayoutKey {
    pub fn new(
        text: impl Into<String>,
        font_id: u32,
        size: f32,
        max_width: Option<f32>,
        wrap: WrapMode,
    ) -> Self {
        Self {
            text: text.into(),
            font_id,
            size_bits: size.to_bits(),
            max_width_bits: max_width.map(f32::to_bits),
            wrap,
        }
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }

    pub fn max_width(&self) -> Option<f32> {
        self.max_width_bits.map(f32::from_bits)
    }
}

/// One glyph placed by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

/// A shaped, line-broken text layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub glyphs: Vec<PositionedGlyph>,
    pub size: Size,
}

impl TextLayout {
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

/// Identity of one glyph at a quantized size, transform-invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub font_id: u32,
    pub glyph_id: u16,
    size_q: u16,
}

impl GlyphKey {
    /// Size quantizes to quarter-pixel steps; outlines at nearly identical
    /// sizes share an entry.
    pub fn new(font_id: u32, glyph_id: u16, size: f32) -> Self {
        Self {
            font_id,
            glyph_id,
            size_q: (size.max(0.0) * 4.0).round() as u16,
        }
    }
}

/// LRU cache of shaped text layouts keyed by shaping parameters.
pub type LayoutCache = GeometryCache<LayoutKey, TextLayout>;

/// LRU cache of extracted glyph outlines keyed by glyph identity.
pub type GlyphOutlineCache = GeometryCache<GlyphKey, Path>;

/// Layout cache with the default capacity.
pub fn layout_cache() -> LayoutCache {
    GeometryCache::new(NonZeroUsize::new(DEFAULT_LAYOUT_CAPACITY).unwrap())
}

/// Glyph outline cache with the default capacity.
pub fn glyph_outline_cache() -> GlyphOutlineCache {
    GeometryCache::new(NonZeroUsize::new(DEFAULT_GLYPH_CAPACITY).unwrap())
}

#[cfg(test)]
mod tests {
    use vireo_core::PathBuilder;

    use super::*;

    #[test]
    fn layout_lru_discipline() {
        let mut c: LayoutCache = GeometryCache::new(NonZeroUsize::new(8).unwrap());
        let key = |i: usize| LayoutKey::new(i.to_string(), 0, 14.0, None, WrapMode::Word);

        for i in 0..8 {
            c.put(key(i), TextLayout::default());
        }
        for i in 0..8 {
            assert!(c.get(&key(i)).is_some(), "key {i} was evicted");
        }
        c.put(key(8), TextLayout::default());
        for i in 1..=8 {
            assert!(c.get(&key(i)).is_some(), "key {i} was evicted");
        }
        assert!(c.get(&key(0)).is_none(), "key 0 was not evicted");
    }

    #[test]
    fn layout_key_distinguishes_all_shaping_inputs() {
        let base = LayoutKey::new("hi", 0, 14.0, None, WrapMode::Word);
        assert_ne!(base, LayoutKey::new("ho", 0, 14.0, None, WrapMode::Word));
        assert_ne!(base, LayoutKey::new("hi", 1, 14.0, None, WrapMode::Word));
        assert_ne!(base, LayoutKey::new("hi", 0, 15.0, None, WrapMode::Word));
        assert_ne!(
            base,
            LayoutKey::new("hi", 0, 14.0, Some(120.0), WrapMode::Word)
        );
        assert_ne!(base, LayoutKey::new("hi", 0, 14.0, None, WrapMode::None));
        assert_eq!(base, LayoutKey::new("hi", 0, 14.0, None, WrapMode::Word));
    }

    #[test]
    fn glyph_key_quantizes_size() {
        assert_eq!(GlyphKey::new(0, 7, 14.0), GlyphKey::new(0, 7, 14.05));
        assert_ne!(GlyphKey::new(0, 7, 14.0), GlyphKey::new(0, 7, 15.0));
        assert_ne!(GlyphKey::new(0, 7, 14.0), GlyphKey::new(0, 8, 14.0));
    }

    #[test]
    fn glyph_outline_round_trips() {
        let mut c = glyph_outline_cache();
        let outline = PathBuilder::new()
            .move_to(0.0, 0.0)
            .quad_to(5.0, -10.0, 10.0, 0.0)
            .close()
            .build();
        let key = GlyphKey::new(3, 42, 16.0);
        c.put(key, outline.clone());
        assert_eq!(c.get(&key), Some(&outline));
    }
}

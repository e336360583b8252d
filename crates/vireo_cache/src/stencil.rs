//! Stencil cache: tessellated path geometry
//!
//! Converts vector paths into triangle meshes using lyon and memoizes the
//! result keyed by path content, so a shape drawn by many widgets (or the
//! same widget across frames) tessellates once.

use std::num::NonZeroUsize;

use lyon::math::point;
use lyon::path::PathEvent;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};

use vireo_core::{Path, PathCommand, Point};

use crate::policy::{CacheStats, GeometryCache};
use crate::{CacheError, Result};

/// Default stencil cache capacity, in entries.
pub const DEFAULT_STENCIL_CAPACITY: usize = 1024;

/// Content-hash key for a tessellated path.
///
/// Two paths built from the same commands produce the same key, across
/// frames and across unrelated widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathKey(u64);

impl PathKey {
    pub fn for_path(path: &Path) -> Self {
        Self(path.content_hash())
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A vertex of tessellated stencil geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StencilVertex {
    pub position: [f32; 2],
}

/// Tessellated fill geometry for one path, ready for GPU upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stencil {
    pub vertices: Vec<StencilVertex>,
    pub indices: Vec<u32>,
}

impl Stencil {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Fill-tessellate a path into triangles.
    pub fn tessellate(path: &Path) -> Result<Stencil> {
        let mut buffers: VertexBuffers<StencilVertex, u32> = VertexBuffers::new();
        let mut tessellator = FillTessellator::new();
        tessellator
            .tessellate(
                path_events(path),
                &FillOptions::default(),
                &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| StencilVertex {
                    position: v.position().to_array(),
                }),
            )
            .map_err(|e| CacheError::Tessellation(format!("{e:?}")))?;
        Ok(Stencil {
            vertices: buffers.vertices,
            indices: buffers.indices,
        })
    }
}

/// Convert path commands to lyon path events.
fn path_events(path: &Path) -> Vec<PathEvent> {
    let mut events = Vec::new();
    let mut first: Option<Point> = None;
    let mut current = Point::ZERO;

    for cmd in path.commands() {
        // Segments before any explicit move begin an implicit subpath at
        // the current position.
        if first.is_none() && !matches!(cmd, PathCommand::MoveTo(_) | PathCommand::Close) {
            events.push(PathEvent::Begin {
                at: point(current.x, current.y),
            });
            first = Some(current);
        }
        match cmd {
            PathCommand::MoveTo(p) => {
                if let Some(f) = first {
                    events.push(PathEvent::End {
                        last: point(current.x, current.y),
                        first: point(f.x, f.y),
                        close: false,
                    });
                }
                events.push(PathEvent::Begin {
                    at: point(p.x, p.y),
                });
                first = Some(*p);
                current = *p;
            }
            PathCommand::LineTo(p) => {
                events.push(PathEvent::Line {
                    from: point(current.x, current.y),
                    to: point(p.x, p.y),
                });
                current = *p;
            }
            PathCommand::QuadTo { control, end } => {
                events.push(PathEvent::Quadratic {
                    from: point(current.x, current.y),
                    ctrl: point(control.x, control.y),
                    to: point(end.x, end.y),
                });
                current = *end;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                events.push(PathEvent::Cubic {
                    from: point(current.x, current.y),
                    ctrl1: point(control1.x, control1.y),
                    ctrl2: point(control2.x, control2.y),
                    to: point(end.x, end.y),
                });
                current = *end;
            }
            PathCommand::Close => {
                if let Some(f) = first {
                    events.push(PathEvent::End {
                        last: point(current.x, current.y),
                        first: point(f.x, f.y),
                        close: true,
                    });
                    current = f;
                    first = None;
                }
            }
        }
    }
    if let Some(f) = first {
        events.push(PathEvent::End {
            last: point(current.x, current.y),
            first: point(f.x, f.y),
            close: false,
        });
    }
    events
}

/// LRU cache of tessellated stencils keyed by path content.
#[derive(Debug)]
pub struct StencilCache {
    cache: GeometryCache<PathKey, Stencil>,
}

impl StencilCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: GeometryCache::new(capacity),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_STENCIL_CAPACITY).unwrap())
    }

    pub fn get(&mut self, key: &PathKey) -> Option<&Stencil> {
        self.cache.get(key)
    }

    pub fn put(&mut self, key: PathKey, stencil: Stencil) {
        self.cache.put(key, stencil);
    }

    /// Fetch the stencil for `path`, tessellating on a miss. Every miss is
    /// exactly one tessellation; hits recompute nothing.
    pub fn get_or_tessellate(&mut self, path: &Path) -> Result<&Stencil> {
        self.cache
            .try_get_or_insert_with(PathKey::for_path(path), || Stencil::tessellate(path))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use vireo_core::PathBuilder;

    use super::*;

    fn square() -> Path {
        PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(10.0, 10.0)
            .line_to(0.0, 10.0)
            .close()
            .build()
    }

    #[test]
    fn tessellate_square_produces_triangles() {
        let stencil = Stencil::tessellate(&square()).unwrap();
        assert!(!stencil.is_empty());
        assert!(stencil.vertices.len() >= 3);
        assert_eq!(stencil.indices.len() % 3, 0);
    }

    #[test]
    fn tessellate_empty_path_is_empty() {
        let stencil = Stencil::tessellate(&Path::new()).unwrap();
        assert!(stencil.is_empty());
    }

    #[test]
    fn repeated_lookups_tessellate_once() {
        let mut cache = StencilCache::with_default_capacity();
        let path = square();
        let first = cache.get_or_tessellate(&path).unwrap().clone();
        let second = cache.get_or_tessellate(&path).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unclosed_subpath_still_fills() {
        let open = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(0.0, 10.0)
            .build();
        let stencil = Stencil::tessellate(&open).unwrap();
        assert!(!stencil.is_empty());
    }
}

//! The frame operation buffer

use std::sync::atomic::{AtomicU64, Ordering};

use vireo_core::{Brush, Color, Ellipse, ImageId, ImageSource, Path, PathCommand, Rect, RoundedRect};

use crate::macros::MacroSpan;

/// Position of an operation in the buffer, stable for the life of the frame.
pub type Pc = usize;

/// Opaque profile tag. Round-trips unchanged from [`Ops::marker`] into the
/// finalized stream, where the event layer correlates it with delivered
/// events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerTag(u64);

impl MarkerTag {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Range into the buffer's out-of-line path command arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathRange {
    pub(crate) start: u32,
    pub(crate) end: u32,
}

/// Clip shape attached to a [`Op::PushClip`].
///
/// Outlines reference path data stored out of line in the owning buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    Rect(Rect),
    RoundedRect(RoundedRect),
    Ellipse(Ellipse),
    Outline(PathRange),
}

impl From<Rect> for ClipShape {
    fn from(rect: Rect) -> Self {
        ClipShape::Rect(rect)
    }
}

impl From<RoundedRect> for ClipShape {
    fn from(rect: RoundedRect) -> Self {
        ClipShape::RoundedRect(rect)
    }
}

impl From<Ellipse> for ClipShape {
    fn from(ellipse: Ellipse) -> Self {
        ClipShape::Ellipse(ellipse)
    }
}

/// One recorded instruction.
///
/// Position in the stream is significant: later operations composite over
/// earlier ones within the same scope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    /// Set the brush used by subsequent `Paint`s. Not scoped; persists
    /// until replaced.
    SetBrush(Brush),
    /// Fill the current effective clip with the current brush.
    Paint,
    PushTransform(vireo_core::Transform),
    PushClip(ClipShape),
    /// Close the most recent open transform or clip scope.
    Pop,
    /// Jump over a macro body during normal playback. Patched to the body
    /// end when the recording stops; an abandoned recording keeps the
    /// end-of-buffer placeholder and never plays.
    Skip(Pc),
    /// Replay a recorded range under the state in effect here.
    Call(MacroSpan),
    /// Queue a recorded range to composite after the rest of the frame,
    /// under the state in effect here.
    Defer(MacroSpan),
    /// Profile marker, carried through to the finalized stream.
    Marker(MarkerTag),
}

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Append-only encoded instruction stream for one frame.
///
/// Owned exclusively by the thread building the frame. Between frames the
/// buffer is [`reset`](Ops::reset) rather than reallocated, which also
/// invalidates macro handles recorded into the previous frame.
#[derive(Debug)]
pub struct Ops {
    pub(crate) id: u64,
    pub(crate) generation: u64,
    pub(crate) ops: Vec<Op>,
    pub(crate) path_data: Vec<PathCommand>,
    pub(crate) images: Vec<ImageSource>,
    /// Current open scope depth, for LIFO checks.
    pub(crate) depth: usize,
}

impl Ops {
    pub fn new() -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            ops: Vec::new(),
            path_data: Vec::new(),
            images: Vec::new(),
            depth: 0,
        }
    }

    /// Append an operation, returning its stable position.
    pub fn write(&mut self, op: Op) -> Pc {
        let pc = self.ops.len();
        self.ops.push(op);
        pc
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn as_slice(&self) -> &[Op] {
        &self.ops
    }

    /// Clear recorded content while keeping backing capacity for the next
    /// frame. Outstanding macro handles become stale.
    pub fn reset(&mut self) {
        tracing::trace!(
            ops = self.ops.len(),
            path_cmds = self.path_data.len(),
            images = self.images.len(),
            "frame buffer reset"
        );
        self.ops.clear();
        self.path_data.clear();
        self.images.clear();
        self.depth = 0;
        self.generation += 1;
    }

    // === Drawing ===

    /// Set the brush for subsequent paints.
    pub fn set_brush(&mut self, brush: impl Into<Brush>) -> Pc {
        self.write(Op::SetBrush(brush.into()))
    }

    /// Fill the current effective clip with the current brush.
    pub fn paint(&mut self) -> Pc {
        self.write(Op::Paint)
    }

    /// Fill `shape` with `brush`: push clip, set brush, paint, pop.
    pub fn fill_shape(&mut self, shape: impl Into<ClipShape>, brush: impl Into<Brush>) {
        let cl = self.push_clip(shape);
        self.set_brush(brush);
        self.paint();
        self.pop(cl);
    }

    /// Fill a path outline with `brush`.
    pub fn fill_path(&mut self, path: &Path, brush: impl Into<Brush>) {
        let shape = self.outline(path);
        self.fill_shape(shape, brush);
    }

    /// Write a profile marker carrying `tag`.
    pub fn marker(&mut self, tag: MarkerTag) -> Pc {
        self.write(Op::Marker(tag))
    }

    // === Out-of-line payload ===

    /// Intern a path into the buffer's arena and return an outline clip
    /// shape referencing it. The shape is only valid for this buffer and
    /// frame.
    pub fn outline(&mut self, path: &Path) -> ClipShape {
        let start = self.path_data.len() as u32;
        self.path_data.extend_from_slice(path.commands());
        let end = self.path_data.len() as u32;
        ClipShape::Outline(PathRange { start, end })
    }

    /// Register image pixel data, returning a brush-able handle.
    pub fn register_image(&mut self, image: ImageSource) -> ImageId {
        let id = ImageId::new(self.images.len() as u32);
        self.images.push(image);
        id
    }

    pub(crate) fn path_slice(&self, range: PathRange) -> &[PathCommand] {
        &self.path_data[range.start as usize..range.end as usize]
    }

    pub(crate) const fn default_brush() -> Brush {
        Brush::Solid(Color::BLACK)
    }
}

impl Default for Ops {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_returns_sequential_positions() {
        let mut ops = Ops::new();
        assert_eq!(ops.write(Op::Paint), 0);
        assert_eq!(ops.write(Op::Pop), 1);
        assert_eq!(ops.write(Op::Paint), 2);
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn reset_clears_content_and_bumps_generation() {
        let mut ops = Ops::new();
        ops.fill_shape(Rect::new(0.0, 0.0, 10.0, 10.0), Color::RED);
        let gen = ops.generation;
        ops.reset();
        assert!(ops.is_empty());
        assert_eq!(ops.path_data.len(), 0);
        assert_eq!(ops.generation, gen + 1);
    }

    #[test]
    fn buffers_have_distinct_ids() {
        assert_ne!(Ops::new().id, Ops::new().id);
    }

    #[test]
    fn outline_interns_path_data() {
        let mut ops = Ops::new();
        let path = vireo_core::PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(0.0, 10.0)
            .close()
            .build();
        let shape = ops.outline(&path);
        let ClipShape::Outline(range) = shape else {
            panic!("expected outline shape");
        };
        assert_eq!(ops.path_slice(range), path.commands());
    }

    #[test]
    fn marker_tag_round_trips() {
        let mut ops = Ops::new();
        let pc = ops.marker(MarkerTag::new(0xdead_beef));
        assert_eq!(ops.as_slice()[pc], Op::Marker(MarkerTag::new(0xdead_beef)));
    }
}

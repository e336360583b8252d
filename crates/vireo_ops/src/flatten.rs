//! Flattening a recorded buffer into the finalized frame stream
//!
//! The flatten pass is the hand-off point to the GPU backend: it walks the
//! buffer once, tracking the transform/clip stack explicitly, resolves
//! macro invocations against the buffer's arena, and drains the deferred
//! queue after the main pass. The output borrows nothing from the buffer.

use std::collections::VecDeque;

use vireo_core::{Brush, Ellipse, Path, Point, Rect, RoundedRect, Transform};

use crate::error::{OpsError, Result};
use crate::macros::MacroSpan;
use crate::ops::{ClipShape, MarkerTag, Op, Ops, Pc};

/// Clip shape with its out-of-line path data resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedClip {
    Rect(Rect),
    RoundedRect(RoundedRect),
    Ellipse(Ellipse),
    Outline(Path),
}

impl ResolvedClip {
    fn contains_local(&self, p: Point) -> bool {
        match self {
            ResolvedClip::Rect(r) => r.contains(p),
            ResolvedClip::RoundedRect(rr) => rr.contains(p),
            ResolvedClip::Ellipse(e) => e.contains(p),
            ResolvedClip::Outline(path) => path.contains(p),
        }
    }
}

/// One clip scope as it applied to a paint: the shape plus the effective
/// transform at the moment it was pushed.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipRegion {
    pub transform: Transform,
    pub shape: ResolvedClip,
    inverse: Option<Transform>,
}

impl ClipRegion {
    fn new(transform: Transform, shape: ResolvedClip) -> Self {
        Self {
            transform,
            shape,
            inverse: transform.invert(),
        }
    }

    /// Whether a point in root coordinates falls inside this clip.
    /// A degenerate (non-invertible) clip transform contains nothing.
    pub fn contains(&self, root: Point) -> bool {
        match self.inverse {
            Some(inv) => self.shape.contains_local(inv.apply(root)),
            None => false,
        }
    }
}

/// A paint operation with its effective state fully resolved.
///
/// `transform` is the effective transform at the paint; the paint fills
/// the intersection of all `clips`, each fixed in its own push-time
/// transform, with `brush` evaluated in the paint's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPaint {
    pub transform: Transform,
    pub clips: Vec<ClipRegion>,
    pub brush: Brush,
    inverse: Option<Transform>,
}

impl ResolvedPaint {
    /// Whether a point in root coordinates is covered by this paint. With
    /// no clip pushed, the effective clip is the whole surface.
    pub fn covers(&self, root: Point) -> bool {
        self.clips.iter().all(|c| c.contains(root))
    }

    /// Map a root-space point into the paint's local (brush) space.
    pub fn to_local(&self, root: Point) -> Point {
        match self.inverse {
            Some(inv) => inv.apply(root),
            None => Point::ZERO,
        }
    }
}

/// Finalized operation stream for one frame, in strict composite order
/// with deferred entries appended.
#[derive(Clone, Debug, Default)]
pub struct FrameStream {
    pub paints: Vec<ResolvedPaint>,
    /// Profile markers as (number of paints composited before the marker,
    /// tag). Tags round-trip unchanged from [`Ops::marker`].
    pub markers: Vec<(usize, MarkerTag)>,
    pub images: Vec<vireo_core::ImageSource>,
}

impl FrameStream {
    pub fn image(&self, id: vireo_core::ImageId) -> Option<&vireo_core::ImageSource> {
        self.images.get(id.raw() as usize)
    }
}

struct Saved {
    transform: Transform,
    clip_len: usize,
}

struct WalkState {
    transform: Transform,
    clips: Vec<ClipRegion>,
    saved: Vec<Saved>,
    brush: Brush,
}

impl WalkState {
    fn root() -> Self {
        Self {
            transform: Transform::IDENTITY,
            clips: Vec::new(),
            saved: Vec::new(),
            brush: Ops::default_brush(),
        }
    }
}

struct Deferred {
    transform: Transform,
    clips: Vec<ClipRegion>,
    brush: Brush,
    span: MacroSpan,
}

/// Resolve a recorded buffer into the finalized per-frame stream.
///
/// Fails on unbalanced scope discipline; a partially built or abandoned
/// buffer should be [`reset`](Ops::reset) instead of flattened.
pub fn flatten(ops: &Ops) -> Result<FrameStream> {
    let mut out = FrameStream {
        images: ops.images.clone(),
        ..Default::default()
    };
    let mut deferred = VecDeque::new();

    let mut state = WalkState::root();
    walk(
        ops,
        MacroSpan {
            start: 0,
            end: ops.len(),
        },
        &mut state,
        &mut out,
        &mut deferred,
    )?;
    if !state.saved.is_empty() {
        return Err(OpsError::UnbalancedScopes(state.saved.len()));
    }

    // Drain the deferred queue in FIFO order, each entry under its own
    // captured state. Entries deferred while draining join the same queue.
    while let Some(entry) = deferred.pop_front() {
        let mut state = WalkState {
            transform: entry.transform,
            clips: entry.clips,
            saved: Vec::new(),
            brush: entry.brush,
        };
        walk(ops, entry.span, &mut state, &mut out, &mut deferred)?;
        if !state.saved.is_empty() {
            return Err(OpsError::UnbalancedScopes(state.saved.len()));
        }
    }

    tracing::trace!(
        paints = out.paints.len(),
        markers = out.markers.len(),
        "flattened frame"
    );
    Ok(out)
}

fn walk(
    ops: &Ops,
    span: MacroSpan,
    state: &mut WalkState,
    out: &mut FrameStream,
    deferred: &mut VecDeque<Deferred>,
) -> Result<()> {
    let mut pc: Pc = span.start;
    while pc < span.end {
        match ops.as_slice()[pc] {
            Op::Skip(end) => {
                // Jump over a macro body; an unstopped recording skips to
                // the end of the walk.
                pc = end.min(span.end);
                continue;
            }
            Op::SetBrush(brush) => state.brush = brush,
            Op::Paint => out.paints.push(ResolvedPaint {
                transform: state.transform,
                clips: state.clips.clone(),
                brush: state.brush,
                inverse: state.transform.invert(),
            }),
            Op::PushTransform(t) => {
                state.saved.push(Saved {
                    transform: state.transform,
                    clip_len: state.clips.len(),
                });
                state.transform = t.then(state.transform);
            }
            Op::PushClip(shape) => {
                state.saved.push(Saved {
                    transform: state.transform,
                    clip_len: state.clips.len(),
                });
                let resolved = resolve_clip(ops, shape);
                state
                    .clips
                    .push(ClipRegion::new(state.transform, resolved));
            }
            Op::Pop => {
                let saved = state.saved.pop().ok_or(OpsError::PopUnderflow)?;
                state.transform = saved.transform;
                state.clips.truncate(saved.clip_len);
            }
            // Called spans always end before their call site (a handle
            // only exists once its recording stopped), so recursion is
            // well-founded.
            Op::Call(span) => walk(ops, span, state, out, deferred)?,
            Op::Defer(span) => deferred.push_back(Deferred {
                transform: state.transform,
                clips: state.clips.clone(),
                brush: state.brush,
                span,
            }),
            Op::Marker(tag) => out.markers.push((out.paints.len(), tag)),
        }
        pc += 1;
    }
    Ok(())
}

fn resolve_clip(ops: &Ops, shape: ClipShape) -> ResolvedClip {
    match shape {
        ClipShape::Rect(r) => ResolvedClip::Rect(r),
        ClipShape::RoundedRect(rr) => ResolvedClip::RoundedRect(rr),
        ClipShape::Ellipse(e) => ResolvedClip::Ellipse(e),
        ClipShape::Outline(range) => {
            ResolvedClip::Outline(Path::from_commands(ops.path_slice(range)))
        }
    }
}

#[cfg(test)]
mod tests {
    use vireo_core::Color;

    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn paint_captures_state_at_write() {
        let mut ops = Ops::new();
        let t = ops.offset(0.0, 50.0);
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        ops.pop(t);
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::GREEN);

        let frame = flatten(&ops).unwrap();
        assert_eq!(frame.paints.len(), 2);
        assert_eq!(frame.paints[0].transform, Transform::translate(0.0, 50.0));
        // After the pop, the second paint sees the pre-push state exactly.
        assert_eq!(frame.paints[1].transform, Transform::IDENTITY);
        assert_eq!(frame.paints[1].clips.len(), 1);
    }

    #[test]
    fn macro_body_is_skipped_unless_called() {
        let mut ops = Ops::new();
        let rec = ops.record();
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        let _m = rec.stop(&mut ops);

        let frame = flatten(&ops).unwrap();
        assert!(frame.paints.is_empty());
    }

    #[test]
    fn calling_twice_replays_under_each_call_site_state() {
        let mut ops = Ops::new();
        let rec = ops.record();
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        let m = rec.stop(&mut ops);

        let t = ops.offset(0.0, 0.0);
        ops.call(&m).unwrap();
        ops.pop(t);
        let t = ops.offset(0.0, 50.0);
        ops.call(&m).unwrap();
        ops.pop(t);

        let frame = flatten(&ops).unwrap();
        assert_eq!(frame.paints.len(), 2);
        assert_eq!(frame.paints[0].transform, Transform::translate(0.0, 0.0));
        assert_eq!(frame.paints[1].transform, Transform::translate(0.0, 50.0));
    }

    #[test]
    fn deferred_paints_composite_after_everything_else() {
        let mut ops = Ops::new();

        let t = ops.offset(20.0, 20.0);
        let rec = ops.record();
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        let m = rec.stop(&mut ops);
        ops.defer(&m).unwrap();
        ops.pop(t);

        // Written after the defer, but composites before it.
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::GREEN);

        let frame = flatten(&ops).unwrap();
        assert_eq!(frame.paints.len(), 2);
        assert_eq!(frame.paints[0].brush, Brush::Solid(Color::GREEN));
        assert_eq!(frame.paints[1].brush, Brush::Solid(Color::RED));
        // Deferred replay uses the state captured at the defer call.
        assert_eq!(frame.paints[1].transform, Transform::translate(20.0, 20.0));
    }

    #[test]
    fn deferred_entries_drain_fifo() {
        let mut ops = Ops::new();
        let mut handles = Vec::new();
        for i in 0..3 {
            let rec = ops.record();
            ops.fill_shape(
                rect(10.0 * i as f32, 0.0, 10.0, 10.0),
                Color::new(i as f32 / 3.0, 0.0, 0.0, 1.0),
            );
            handles.push(rec.stop(&mut ops));
        }
        for h in &handles {
            ops.defer(h).unwrap();
        }

        let frame = flatten(&ops).unwrap();
        let reds: Vec<f32> = frame
            .paints
            .iter()
            .map(|p| match p.brush {
                Brush::Solid(c) => c.r,
                _ => panic!("expected solid brush"),
            })
            .collect();
        assert_eq!(reds, vec![0.0, 1.0 / 3.0, 2.0 / 3.0]);
    }

    #[test]
    fn deferred_body_may_defer_again() {
        let mut ops = Ops::new();

        let rec = ops.record();
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::BLUE);
        let inner = rec.stop(&mut ops);

        // The outer body paints and then defers the inner macro.
        let t = ops.offset(7.0, 0.0);
        let rec = ops.record();
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        ops.defer(&inner).unwrap();
        let outer = rec.stop(&mut ops);
        ops.defer(&outer).unwrap();
        ops.pop(t);

        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::GREEN);

        let frame = flatten(&ops).unwrap();
        let brushes: Vec<Brush> = frame.paints.iter().map(|p| p.brush).collect();
        assert_eq!(
            brushes,
            vec![
                Brush::Solid(Color::GREEN),
                Brush::Solid(Color::RED),
                Brush::Solid(Color::BLUE),
            ]
        );
        // The inner entry joined the queue while the outer body replayed,
        // capturing the outer entry's state.
        assert_eq!(frame.paints[2].transform, Transform::translate(7.0, 0.0));
    }

    #[test]
    fn pop_underflow_is_an_error() {
        let mut ops = Ops::new();
        ops.write(Op::Pop);
        assert_eq!(flatten(&ops).unwrap_err(), OpsError::PopUnderflow);
    }

    #[test]
    fn open_scope_at_end_is_an_error() {
        let mut ops = Ops::new();
        ops.write(Op::PushTransform(Transform::translate(1.0, 0.0)));
        assert_eq!(flatten(&ops).unwrap_err(), OpsError::UnbalancedScopes(1));
    }

    #[test]
    fn marker_positions_and_tags_round_trip() {
        let mut ops = Ops::new();
        ops.marker(MarkerTag::new(7));
        ops.fill_shape(rect(0.0, 0.0, 10.0, 10.0), Color::RED);
        ops.marker(MarkerTag::new(9));

        let frame = flatten(&ops).unwrap();
        assert_eq!(
            frame.markers,
            vec![(0, MarkerTag::new(7)), (1, MarkerTag::new(9))]
        );
    }

    #[test]
    fn paint_without_brush_defaults_to_black() {
        let mut ops = Ops::new();
        let cl = ops.push_clip(rect(0.0, 0.0, 10.0, 10.0));
        ops.paint();
        ops.pop(cl);

        let frame = flatten(&ops).unwrap();
        assert_eq!(frame.paints[0].brush, Brush::Solid(Color::BLACK));
    }

    #[test]
    fn paint_with_no_clip_covers_the_whole_surface() {
        let mut ops = Ops::new();
        ops.set_brush(Color::RED);
        ops.paint();

        let frame = flatten(&ops).unwrap();
        assert!(frame.paints[0].covers(Point::new(1.0, 1.0)));
        assert!(frame.paints[0].covers(Point::new(500.0, -3.0)));
    }
}

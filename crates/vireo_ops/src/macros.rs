//! Macro recording and replay
//!
//! A macro captures a contiguous sub-range of the buffer via
//! [`Ops::record`] / [`MacroRecording::stop`]. The captured operations are
//! skipped during normal playback and replay only where the handle is
//! [`call`](Ops::call)ed — under the transform/clip state in effect at the
//! call site, so one recorded subtree can be stamped at several offsets
//! without re-issuing its operations.
//!
//! Replay copies nothing: a handle is a range into the arena of the buffer
//! it was recorded in, and is only valid there. Handles from another
//! buffer, or from before a [`reset`](Ops::reset), are rejected.

use crate::error::{OpsError, Result};
use crate::ops::{Op, Ops, Pc};

/// Placeholder jump target for a recording that has not stopped yet. Points
/// past any valid pc, so an abandoned recording never plays.
const OPEN_SKIP: Pc = Pc::MAX;

/// Captured range of operations, resolved against the owning buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacroSpan {
    pub(crate) start: Pc,
    pub(crate) end: Pc,
}

/// An in-progress macro recording returned by [`Ops::record`].
#[derive(Debug)]
#[must_use = "a recording must be stopped to obtain a macro handle"]
pub struct MacroRecording {
    skip_pc: Pc,
    base_depth: usize,
    buffer: u64,
    generation: u64,
}

/// Replayable capture of a recorded operation range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacroHandle {
    pub(crate) span: MacroSpan,
    pub(crate) buffer: u64,
    pub(crate) generation: u64,
}

impl Ops {
    /// Open a sub-recording. Everything written until
    /// [`stop`](MacroRecording::stop) belongs to the macro and is excluded
    /// from normal playback.
    pub fn record(&mut self) -> MacroRecording {
        let skip_pc = self.write(Op::Skip(OPEN_SKIP));
        MacroRecording {
            skip_pc,
            base_depth: self.depth,
            buffer: self.id,
            generation: self.generation,
        }
    }

    /// Append an invocation of a recorded macro. The body composites as if
    /// written here, under the current transform/clip state.
    pub fn call(&mut self, handle: &MacroHandle) -> Result<Pc> {
        self.check_handle(handle)?;
        Ok(self.write(Op::Call(handle.span)))
    }

    /// Schedule a recorded macro to composite after all non-deferred
    /// content of this frame, under the transform/clip state current at
    /// this call. Multiple deferred macros replay in the order deferred.
    pub fn defer(&mut self, handle: &MacroHandle) -> Result<Pc> {
        self.check_handle(handle)?;
        Ok(self.write(Op::Defer(handle.span)))
    }

    fn check_handle(&self, handle: &MacroHandle) -> Result<()> {
        if handle.buffer != self.id {
            return Err(OpsError::ForeignMacro);
        }
        if handle.generation != self.generation {
            return Err(OpsError::StaleMacro);
        }
        Ok(())
    }
}

impl MacroRecording {
    /// Close the recording, patching the playback jump over its body, and
    /// return the replayable handle.
    pub fn stop(self, ops: &mut Ops) -> MacroHandle {
        debug_assert_eq!(
            self.buffer, ops.id,
            "macro recording stopped on a different buffer"
        );
        debug_assert_eq!(
            self.generation, ops.generation,
            "macro recording outlived a buffer reset"
        );
        debug_assert_eq!(
            self.base_depth, ops.depth,
            "macro body left transform/clip scopes open"
        );
        let end = ops.len();
        ops.ops[self.skip_pc] = Op::Skip(end);
        MacroHandle {
            span: MacroSpan {
                start: self.skip_pc + 1,
                end,
            },
            buffer: self.buffer,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use vireo_core::{Color, Rect};

    use super::*;

    #[test]
    fn stop_patches_skip_over_body() {
        let mut ops = Ops::new();
        let rec = ops.record();
        ops.fill_shape(Rect::new(0.0, 0.0, 10.0, 10.0), Color::RED);
        let m = rec.stop(&mut ops);

        assert_eq!(ops.as_slice()[0], Op::Skip(m.span.end));
        assert_eq!(m.span.start, 1);
        assert_eq!(m.span.end, ops.len());
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = Ops::new();
        let rec = a.record();
        let m = rec.stop(&mut a);

        let mut b = Ops::new();
        assert_eq!(b.call(&m), Err(OpsError::ForeignMacro));
        assert_eq!(b.defer(&m), Err(OpsError::ForeignMacro));
    }

    #[test]
    fn stale_handle_is_rejected_after_reset() {
        let mut ops = Ops::new();
        let rec = ops.record();
        let m = rec.stop(&mut ops);

        ops.reset();
        assert_eq!(ops.call(&m), Err(OpsError::StaleMacro));
        assert_eq!(ops.defer(&m), Err(OpsError::StaleMacro));
    }

    #[test]
    fn nested_recordings_capture_nested_ranges() {
        let mut ops = Ops::new();
        let outer = ops.record();
        ops.set_brush(Color::RED);
        let inner = ops.record();
        ops.paint();
        let mi = inner.stop(&mut ops);
        let mo = outer.stop(&mut ops);

        assert!(mo.span.start < mi.span.start);
        assert!(mi.span.end <= mo.span.end);
    }

    #[test]
    #[should_panic(expected = "scopes open")]
    fn unbalanced_macro_body_is_detected() {
        let mut ops = Ops::new();
        let rec = ops.record();
        let _t = ops.offset(5.0, 5.0);
        let _ = rec.stop(&mut ops);
    }
}

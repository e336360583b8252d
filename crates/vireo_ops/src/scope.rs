//! Scoped transform and clip state
//!
//! Pushing a transform or clip returns a [`ScopeHandle`]; the caller must
//! pop the most recently returned outstanding handle before leaving the
//! scope that pushed it. Misuse is a caller bug: debug builds assert the
//! LIFO discipline, release builds surface imbalance when the buffer is
//! flattened.

use vireo_core::Transform;

use crate::ops::{ClipShape, Op, Ops, Pc};

/// Opaque handle for one pushed transform or clip scope.
///
/// Handles order themselves by depth; each push's handle must be popped
/// while it is the deepest outstanding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pushed scope must be popped"]
pub struct ScopeHandle {
    pub(crate) depth: usize,
    pub(crate) buffer: u64,
    pub(crate) generation: u64,
}

impl Ops {
    /// Push a transform composed onto the current effective transform.
    pub fn push_transform(&mut self, transform: Transform) -> ScopeHandle {
        self.write(Op::PushTransform(transform));
        self.enter_scope()
    }

    /// Push a clip intersected with the current effective clip. The shape
    /// is interpreted in the transform current at the push.
    pub fn push_clip(&mut self, shape: impl Into<ClipShape>) -> ScopeHandle {
        self.write(Op::PushClip(shape.into()));
        self.enter_scope()
    }

    /// Sugar for a pure-translation transform push.
    pub fn offset(&mut self, x: f32, y: f32) -> ScopeHandle {
        self.push_transform(Transform::translate(x, y))
    }

    /// Close the scope opened by `handle`, restoring the parent transform
    /// and clip exactly.
    pub fn pop(&mut self, handle: ScopeHandle) -> Pc {
        debug_assert_eq!(
            handle.buffer, self.id,
            "scope handle popped on a different buffer"
        );
        debug_assert_eq!(
            handle.generation, self.generation,
            "scope handle outlived a buffer reset"
        );
        debug_assert!(self.depth > 0, "pop without matching push");
        debug_assert_eq!(
            handle.depth, self.depth,
            "scope popped out of LIFO order"
        );
        self.depth = self.depth.saturating_sub(1);
        self.write(Op::Pop)
    }

    fn enter_scope(&mut self) -> ScopeHandle {
        self.depth += 1;
        ScopeHandle {
            depth: self.depth,
            buffer: self.id,
            generation: self.generation,
        }
    }
}

//! Vireo frame operation buffer
//!
//! The recording substrate of the render pipeline. Widget code writes draw,
//! transform, and clip instructions into an [`Ops`] buffer once per frame;
//! at frame end the buffer is flattened into a [`FrameStream`] for the GPU
//! backend.
//!
//! # Features
//!
//! - **Operation buffer**: append-only command stream, reset (not
//!   reallocated) between frames
//! - **Scoped transforms/clips**: push returns a handle, pop restores the
//!   exact parent state, LIFO-checked in debug builds
//! - **Macros**: record a sub-range once, invoke it many times under
//!   different transform contexts
//! - **Deferred draws**: capture state now, composite after everything else
//!   in the frame
//! - **Profile markers**: opaque tags that round-trip into the finalized
//!   stream
//!
//! # Example
//!
//! ```
//! use vireo_core::{Color, Rect};
//! use vireo_ops::{flatten, ClipShape, Ops};
//!
//! let mut ops = Ops::new();
//!
//! // Record a reusable square once.
//! let rec = ops.record();
//! ops.fill_shape(ClipShape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)), Color::RED);
//! let square = rec.stop(&mut ops);
//!
//! // Stamp it at two offsets.
//! let t = ops.offset(0.0, 0.0);
//! ops.call(&square).unwrap();
//! ops.pop(t);
//! let t = ops.offset(0.0, 50.0);
//! ops.call(&square).unwrap();
//! ops.pop(t);
//!
//! let frame = flatten(&ops).unwrap();
//! assert_eq!(frame.paints.len(), 2);
//! ```

pub mod error;
pub mod flatten;
pub mod macros;
pub mod ops;
pub mod scope;

pub use error::{OpsError, Result};
pub use flatten::{flatten, ClipRegion, FrameStream, ResolvedClip, ResolvedPaint};
pub use macros::{MacroHandle, MacroRecording, MacroSpan};
pub use ops::{ClipShape, MarkerTag, Op, Ops, PathRange, Pc};
pub use scope::ScopeHandle;

//! PDF Ink UI Library
//!
//! The stroke canvas engine: pointer capture, palm rejection, smoothed
//! incremental stroke rendering, and translucent-stroke compositing.

pub mod compositor;
pub mod engine;
pub mod input;

pub use compositor::{draw_segment, replay_strokes, segment_path, FrameGate, SegmentPath};
pub use engine::{EngineError, EngineResult, StrokeCanvasEngine};
pub use input::{InputSample, PointerEvent, PointerKind, TouchPolicy};

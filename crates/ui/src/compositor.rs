// Stroke compositing - smoothing geometry, full-stroke replay, and the
// frame gate that coalesces highlighter composite passes.
//
// Incremental capture and full redraw share the same segment math so a
// reloaded stroke rasterizes exactly like it did while being drawn.

use pdf_ink_core::stroke::{InputPoint, Stroke, Tool, ToolConfig};
use pdf_ink_render::surface::{CompositeMode, Surface, SurfaceResult};

/// Path of one rendered stroke segment.
///
/// For strokes with at least three points, segments are quadratic
/// curves: the previous point is the control point and the midpoint of
/// the two most recent points is the endpoint. The first two points
/// are joined by a straight line (no smoothing possible yet).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentPath {
    Line { from: (f32, f32), to: (f32, f32) },
    Quad { from: (f32, f32), ctrl: (f32, f32), to: (f32, f32) },
}

fn midpoint(a: &InputPoint, b: &InputPoint) -> (f32, f32) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// The path for the segment ending at `points[index]`.
///
/// Returns `None` for index 0 (a single point renders as a dot, not a
/// segment) and for out-of-range indices.
pub fn segment_path(points: &[InputPoint], index: usize) -> Option<SegmentPath> {
    if index == 0 || index >= points.len() {
        return None;
    }
    if index == 1 {
        let (a, b) = (&points[0], &points[1]);
        return Some(SegmentPath::Line { from: (a.x, a.y), to: (b.x, b.y) });
    }
    let (before, prev, newest) = (&points[index - 2], &points[index - 1], &points[index]);
    Some(SegmentPath::Quad {
        from: midpoint(before, prev),
        ctrl: (prev.x, prev.y),
        to: midpoint(prev, newest),
    })
}

/// Draw the segment ending at `points[index]` onto a surface.
pub fn draw_segment(
    surface: &mut Surface,
    points: &[InputPoint],
    index: usize,
    width: f32,
    rgb: (u8, u8, u8),
    opacity: f32,
    mode: CompositeMode,
) {
    match segment_path(points, index) {
        Some(SegmentPath::Line { from, to }) => {
            surface.stroke_line(from, to, width, rgb, opacity, mode)
        }
        Some(SegmentPath::Quad { from, ctrl, to }) => {
            surface.stroke_quad(from, ctrl, to, width, rgb, opacity, mode)
        }
        None => {}
    }
}

/// Draw one committed stroke in full.
///
/// Opaque tools paint a start dot then each segment directly, the same
/// ops incremental capture used. The highlighter goes through a scratch
/// surface at full opacity and composites once at its target opacity,
/// so self-overlap never double-darkens - for reloaded strokes exactly
/// as for live ones. A single-point highlighter stroke renders its
/// deferred dot here.
fn draw_stroke(ink: &mut Surface, stroke: &Stroke, config: &ToolConfig) -> SurfaceResult<()> {
    if stroke.is_empty() {
        return Ok(());
    }
    let rgb = stroke.color.rgb();
    let width = stroke.line_width;
    let mode = if stroke.tool.erases() { CompositeMode::Erase } else { CompositeMode::Over };

    if stroke.tool == Tool::Highlighter {
        let mut scratch = Surface::new(ink.width(), ink.height(), ink.dpr())?;
        paint_stroke_body(&mut scratch, stroke, width, rgb, CompositeMode::Over, true);
        ink.composite(&scratch, config.opacity(stroke.tool));
    } else {
        paint_stroke_body(ink, stroke, width, rgb, mode, false);
    }
    Ok(())
}

/// Dot-plus-segments body shared by opaque and scratch rendering.
///
/// `defer_start_dot` matches live highlighter capture: no dot at the
/// first point unless the stroke never grew past it.
fn paint_stroke_body(
    surface: &mut Surface,
    stroke: &Stroke,
    width: f32,
    rgb: (u8, u8, u8),
    mode: CompositeMode,
    defer_start_dot: bool,
) {
    let first = &stroke.points[0];
    if !defer_start_dot || stroke.len() == 1 {
        surface.fill_dot((first.x, first.y), width / 2.0, rgb, 1.0, mode);
    }
    for index in 1..stroke.len() {
        draw_segment(surface, &stroke.points, index, width, rgb, 1.0, mode);
    }
}

/// Redraw a full stroke list from scratch, in z-order.
pub fn replay_strokes(
    ink: &mut Surface,
    strokes: &[Stroke],
    config: &ToolConfig,
) -> SurfaceResult<()> {
    ink.clear();
    for stroke in strokes {
        draw_stroke(ink, stroke, config)?;
    }
    Ok(())
}

/// Coalescing gate for the frame-throttled highlighter composite.
///
/// At most one composite may be pending per in-progress stroke: a new
/// input sample while one is pending only re-marks it, it never queues
/// a second callback.
#[derive(Debug, Default)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that a composite is needed. Idempotent.
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Consume the pending mark, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn reset(&mut self) {
        self.pending = false;
    }
}

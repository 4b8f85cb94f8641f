//! Stroke canvas engine
//!
//! Turns a stream of pointer events into committed vector strokes on an
//! ink-only surface. The engine owns the annotation layer; the page
//! raster lives on a separate surface owned by the page slot, so erase
//! blending can never touch page content.
//!
//! Expected event-ordering races (a move without a down, a leave after
//! an up) are silently ignored rather than reported: they are
//! legitimate interleavings of the input source, not errors.

use crate::compositor::{draw_segment, replay_strokes, FrameGate};
use crate::input::{PointerEvent, TouchPolicy};
use pdf_ink_core::stroke::{HexColor, Stroke, Tool, ToolConfig};
use pdf_ink_render::surface::{CompositeMode, Snapshot, Surface, SurfaceError};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Scratch state for an in-progress highlighter stroke.
///
/// The stroke is drawn at full opacity onto `scratch`; each composite
/// pass restores `snapshot` (the committed pixels at stroke start) and
/// lays the scratch on top once at the target opacity, so self-overlap
/// never double-darkens. Both are discarded on stroke end.
struct HighlightPass {
    scratch: Surface,
    snapshot: Snapshot,
}

/// The stroke being captured between pointer-down and pointer-up.
struct ActiveStroke {
    stroke: Stroke,
    pointer_id: u64,
    highlight: Option<HighlightPass>,
}

/// Per-page stroke capture and rendering.
///
/// Created when a page becomes visible, destroyed (after the owner
/// flushes its strokes) when the page unmounts or its geometry changes.
/// All coordinates are logical pixels; the surface scales by the
/// device pixel ratio internally.
pub struct StrokeCanvasEngine {
    ink: Surface,
    committed: Vec<Stroke>,
    active: Option<ActiveStroke>,
    tool: Tool,
    color: HexColor,
    config: ToolConfig,
    gate: FrameGate,
}

impl StrokeCanvasEngine {
    /// Allocate an engine with a transparent ink surface.
    ///
    /// Fails if the surface cannot be allocated; callers must not
    /// proceed without one.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32, config: ToolConfig) -> EngineResult<Self> {
        let ink = Surface::new(width, height, device_pixel_ratio)?;
        let color = config.default_color.clone();
        Ok(Self {
            ink,
            committed: Vec::new(),
            active: None,
            tool: Tool::Pen,
            color,
            config,
            gate: FrameGate::new(),
        })
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. An in-progress stroke is finished first so a tool
    /// change can never retroactively restyle captured points.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.active.is_some() {
            self.finish_stroke();
        }
        self.tool = tool;
    }

    pub fn color(&self) -> &HexColor {
        &self.color
    }

    /// Set the ink color for subsequently started strokes. Never
    /// affects the stroke currently being captured.
    pub fn set_color(&mut self, color: HexColor) {
        self.color = color;
    }

    /// The touch pass-through policy for the current tool.
    pub fn touch_policy(&self) -> TouchPolicy {
        TouchPolicy::for_tool(self.tool)
    }

    /// The ink surface, for presentation compositing above the raster.
    pub fn surface(&self) -> &Surface {
        &self.ink
    }

    pub fn width(&self) -> f32 {
        self.ink.width()
    }

    pub fn height(&self) -> f32 {
        self.ink.height()
    }

    fn composite_mode(&self) -> CompositeMode {
        if self.tool.erases() { CompositeMode::Erase } else { CompositeMode::Over }
    }

    /// Begin capturing a stroke.
    ///
    /// Ignored for the hand tool, for rejected touch input, and while
    /// another stroke is already in progress. Paints an immediate dot
    /// so a tap without a drag still marks the page - except for the
    /// highlighter, whose first dot is deferred to the first segment to
    /// avoid a visible seam at stroke start.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) {
        if self.active.is_some() || !self.touch_policy().accepts(event) {
            return;
        }

        let line_width = self.config.line_width(self.tool, event.pressure);
        let mut stroke = Stroke::new(self.tool, self.color.clone(), line_width);
        let samples = event.samples();
        for sample in &samples {
            stroke.push(sample.to_point());
        }

        let highlight = if self.tool == Tool::Highlighter {
            match Surface::new(self.ink.width(), self.ink.height(), self.ink.dpr()) {
                Ok(scratch) => Some(HighlightPass { scratch, snapshot: self.ink.snapshot() }),
                Err(err) => {
                    warn!(error = %err, "highlighter scratch unavailable, not capturing");
                    return;
                }
            }
        } else {
            None
        };

        if highlight.is_none() {
            let composite_mode = self.composite_mode();
            let first = &stroke.points[0];
            self.ink.fill_dot(
                (first.x, first.y),
                line_width / 2.0,
                stroke.color.rgb(),
                1.0,
                composite_mode,
            );
            for index in 1..stroke.len() {
                draw_segment(
                    &mut self.ink,
                    &stroke.points,
                    index,
                    line_width,
                    stroke.color.rgb(),
                    1.0,
                    composite_mode,
                );
            }
        }

        self.active = Some(ActiveStroke { stroke, pointer_id: event.pointer_id, highlight });
    }

    /// Append samples to the in-progress stroke, rendering only the
    /// newest segment per sample. No-op without a matching capture.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) {
        let Some(active) = self.active.as_mut() else { return };
        if active.pointer_id != event.pointer_id {
            return;
        }

        let rgb = active.stroke.color.rgb();
        let width = active.stroke.line_width;
        let erase = active.stroke.tool.erases();
        for sample in event.samples() {
            active.stroke.push(sample.to_point());
            let index = active.stroke.len() - 1;
            match active.highlight.as_mut() {
                Some(pass) => {
                    // Full opacity on the scratch; the gate schedules a
                    // single composite at target opacity per frame.
                    draw_segment(
                        &mut pass.scratch,
                        &active.stroke.points,
                        index,
                        width,
                        rgb,
                        1.0,
                        CompositeMode::Over,
                    );
                    self.gate.request();
                }
                None => {
                    let mode =
                        if erase { CompositeMode::Erase } else { CompositeMode::Over };
                    draw_segment(
                        &mut self.ink,
                        &active.stroke.points,
                        index,
                        width,
                        rgb,
                        1.0,
                        mode,
                    );
                }
            }
        }
    }

    /// Whether a composite pass is pending for the next display frame.
    pub fn needs_frame(&self) -> bool {
        self.gate.is_pending()
    }

    /// Run the at-most-one pending highlighter composite.
    ///
    /// Called once per display refresh by the host while a stroke is in
    /// progress; a no-op when nothing is pending.
    pub fn on_frame(&mut self) {
        if !self.gate.take() {
            return;
        }
        if let Some(active) = self.active.as_ref() {
            if let Some(pass) = active.highlight.as_ref() {
                self.ink.restore(&pass.snapshot);
                self.ink.composite(&pass.scratch, self.config.opacity(Tool::Highlighter));
            }
        }
    }

    /// End capture, committing the stroke. Pointer-leave and
    /// pointer-cancel are treated identically; an up from an unrelated
    /// pointer is ignored.
    pub fn on_pointer_up(&mut self, event: &PointerEvent) {
        if let Some(active) = self.active.as_ref() {
            if active.pointer_id != event.pointer_id {
                return;
            }
        }
        self.finish_stroke();
    }

    pub fn on_pointer_leave(&mut self) {
        self.finish_stroke();
    }

    /// Identical to pointer-up for commit purposes: no rollback.
    pub fn on_pointer_cancel(&mut self) {
        self.finish_stroke();
    }

    fn finish_stroke(&mut self) {
        let Some(mut active) = self.active.take() else { return };
        self.gate.reset();

        if let Some(pass) = active.highlight.as_mut() {
            if active.stroke.len() == 1 {
                // A tap never produced a segment; paint the deferred dot.
                let first = &active.stroke.points[0];
                pass.scratch.fill_dot(
                    (first.x, first.y),
                    active.stroke.line_width / 2.0,
                    active.stroke.color.rgb(),
                    1.0,
                    CompositeMode::Over,
                );
            }
            // One final composite, then scratch and snapshot are dropped.
            self.ink.restore(&pass.snapshot);
            self.ink.composite(&pass.scratch, self.config.opacity(Tool::Highlighter));
        }

        if !active.stroke.is_empty() {
            debug!(points = active.stroke.len(), tool = ?active.stroke.tool, "stroke committed");
            self.committed.push(active.stroke);
        }
    }

    /// Discard all committed strokes and blank the surface. An
    /// in-progress stroke is discarded with them.
    pub fn clear(&mut self) {
        self.active = None;
        self.gate.reset();
        self.committed.clear();
        self.ink.clear();
    }

    /// Committed strokes, in z-order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.committed
    }

    /// Flush for teardown: returns the committed strokes and leaves the
    /// engine empty. An in-progress stroke is discarded, never
    /// partially committed.
    pub fn take_strokes(&mut self) -> Vec<Stroke> {
        self.active = None;
        self.gate.reset();
        self.ink.clear();
        std::mem::take(&mut self.committed)
    }

    /// Replace the committed list and redraw everything from scratch.
    pub fn load_strokes(&mut self, strokes: Vec<Stroke>) -> EngineResult<()> {
        self.active = None;
        self.gate.reset();
        self.committed = strokes;
        replay_strokes(&mut self.ink, &self.committed, &self.config)?;
        Ok(())
    }

    /// Resize the surface and redraw all committed strokes scaled to
    /// the new geometry. Pointer coordinates are captured in current
    /// surface space, so the redraw must follow the resize or later
    /// strokes would land on stale geometry.
    pub fn resize(&mut self, width: f32, height: f32) -> EngineResult<()> {
        let scale_x = width / self.ink.width();
        let scale_y = height / self.ink.height();

        self.active = None;
        self.gate.reset();
        self.ink.resize(width, height)?;

        for stroke in &mut self.committed {
            for point in &mut stroke.points {
                point.x *= scale_x;
                point.y *= scale_y;
            }
        }
        replay_strokes(&mut self.ink, &self.committed, &self.config)?;
        Ok(())
    }
}

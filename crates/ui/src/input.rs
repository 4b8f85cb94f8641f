//! Pointer input model and palm rejection
//!
//! Hosts translate their native pointer/stylus/touch events into
//! [`PointerEvent`]s. Events are delivered strictly ordered per pointer
//! id by the input source; coalesced sub-samples preserve that order
//! and are never reordered here.

use pdf_ink_core::stroke::{InputPoint, Tool};

/// The kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Pen,
    Touch,
    Mouse,
}

/// One input sample: position, pressure, tilt, timestamp.
///
/// High-frequency input sources batch several of these between
/// dispatched move events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSample {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
    pub timestamp: f64,
}

impl InputSample {
    pub fn new(x: f32, y: f32, pressure: f32, timestamp: f64) -> Self {
        Self { x, y, pressure, tilt_x: 0.0, tilt_y: 0.0, timestamp }
    }

    pub fn to_point(self) -> InputPoint {
        InputPoint::new(self.x, self.y, self.pressure, self.tilt_x, self.tilt_y, self.timestamp)
    }
}

/// A dispatched pointer event, in page-local logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
    pub timestamp: f64,
    /// Number of touch points currently on the digitizer, including
    /// this one for touch events. Two or more means a gesture.
    pub active_touches: u8,
    /// High-frequency sub-samples batched since the previous dispatch,
    /// oldest first. Empty means the event carries its only sample.
    pub coalesced: Vec<InputSample>,
}

impl PointerEvent {
    /// A pen event with pressure; tilt defaults to zero.
    pub fn pen(pointer_id: u64, x: f32, y: f32, pressure: f32, timestamp: f64) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Pen,
            x,
            y,
            pressure,
            tilt_x: 0.0,
            tilt_y: 0.0,
            timestamp,
            active_touches: 0,
            coalesced: Vec::new(),
        }
    }

    /// A mouse event; pressure takes the no-axis default.
    pub fn mouse(pointer_id: u64, x: f32, y: f32, timestamp: f64) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Mouse,
            x,
            y,
            pressure: InputPoint::DEFAULT_PRESSURE,
            tilt_x: 0.0,
            tilt_y: 0.0,
            timestamp,
            active_touches: 0,
            coalesced: Vec::new(),
        }
    }

    /// A touch event with the current finger count.
    pub fn touch(pointer_id: u64, x: f32, y: f32, active_touches: u8, timestamp: f64) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Touch,
            x,
            y,
            pressure: InputPoint::DEFAULT_PRESSURE,
            tilt_x: 0.0,
            tilt_y: 0.0,
            timestamp,
            active_touches,
            coalesced: Vec::new(),
        }
    }

    pub fn with_coalesced(mut self, samples: Vec<InputSample>) -> Self {
        self.coalesced = samples;
        self
    }

    fn own_sample(&self) -> InputSample {
        InputSample {
            x: self.x,
            y: self.y,
            pressure: self.pressure,
            tilt_x: self.tilt_x,
            tilt_y: self.tilt_y,
            timestamp: self.timestamp,
        }
    }

    /// The samples this event contributes, in delivery order: the
    /// coalesced batch when present, otherwise the event itself.
    pub fn samples(&self) -> Vec<InputSample> {
        if self.coalesced.is_empty() {
            vec![self.own_sample()]
        } else {
            self.coalesced.clone()
        }
    }
}

/// How touch input is treated for the current tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPolicy {
    /// Whether pointer input is captured at all. False for the hand
    /// tool, which leaves the surface transparent to input so the host
    /// can pan and zoom.
    pub captures_input: bool,
    /// Whether single-touch input bypasses palm rejection.
    pub accept_touch: bool,
}

impl TouchPolicy {
    pub fn for_tool(tool: Tool) -> Self {
        if tool.is_drawing() {
            Self { captures_input: true, accept_touch: false }
        } else {
            Self { captures_input: false, accept_touch: false }
        }
    }

    /// Whether the engine should capture this event.
    ///
    /// Multi-touch gestures pass through untouched for scroll and
    /// pinch-zoom; that check comes before the single-touch rejection
    /// rule. Pen and mouse are always accepted while capturing. This is
    /// a heuristic, not a guarantee.
    pub fn accepts(&self, event: &PointerEvent) -> bool {
        if !self.captures_input {
            return false;
        }
        if event.active_touches >= 2 {
            return false;
        }
        match event.kind {
            PointerKind::Pen | PointerKind::Mouse => true,
            PointerKind::Touch => self.accept_touch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_and_mouse_always_accepted() {
        let policy = TouchPolicy::for_tool(Tool::Pen);
        assert!(policy.accepts(&PointerEvent::pen(1, 0.0, 0.0, 0.7, 0.0)));
        assert!(policy.accepts(&PointerEvent::mouse(2, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_single_touch_rejected_for_drawing_tools() {
        for tool in [Tool::Pen, Tool::Highlighter, Tool::Eraser] {
            let policy = TouchPolicy::for_tool(tool);
            assert!(!policy.accepts(&PointerEvent::touch(1, 0.0, 0.0, 1, 0.0)));
        }
    }

    #[test]
    fn test_multi_touch_passes_through() {
        let policy = TouchPolicy::for_tool(Tool::Pen);
        assert!(!policy.accepts(&PointerEvent::touch(1, 0.0, 0.0, 2, 0.0)));
        assert!(!policy.accepts(&PointerEvent::touch(1, 0.0, 0.0, 3, 0.0)));
    }

    #[test]
    fn test_multi_touch_check_precedes_kind_check() {
        // Even a pen event reporting two concurrent touches passes
        // through: the gesture check runs first.
        let policy = TouchPolicy::for_tool(Tool::Pen);
        let mut event = PointerEvent::pen(1, 0.0, 0.0, 0.5, 0.0);
        event.active_touches = 2;
        assert!(!policy.accepts(&event));
    }

    #[test]
    fn test_hand_tool_captures_nothing() {
        let policy = TouchPolicy::for_tool(Tool::Hand);
        assert!(!policy.accepts(&PointerEvent::pen(1, 0.0, 0.0, 1.0, 0.0)));
        assert!(!policy.accepts(&PointerEvent::mouse(1, 0.0, 0.0, 0.0)));
        assert!(!policy.accepts(&PointerEvent::touch(1, 0.0, 0.0, 1, 0.0)));
    }

    #[test]
    fn test_samples_fall_back_to_event() {
        let event = PointerEvent::pen(1, 3.0, 4.0, 0.6, 9.0);
        let samples = event.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].x, 3.0);
        assert_eq!(samples[0].pressure, 0.6);
    }

    #[test]
    fn test_samples_prefer_coalesced_in_order() {
        let event = PointerEvent::pen(1, 5.0, 5.0, 0.5, 20.0).with_coalesced(vec![
            InputSample::new(1.0, 1.0, 0.5, 17.0),
            InputSample::new(2.0, 2.0, 0.6, 18.0),
            InputSample::new(3.0, 3.0, 0.7, 19.0),
        ]);
        let samples = event.samples();
        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_sample_to_point() {
        let sample = InputSample { x: 1.0, y: 2.0, pressure: 0.9, tilt_x: 30.0, tilt_y: -10.0, timestamp: 4.0 };
        let point = sample.to_point();
        assert_eq!(point.x, 1.0);
        assert_eq!(point.tilt_x, 30.0);
        assert_eq!(point.timestamp, 4.0);
    }
}

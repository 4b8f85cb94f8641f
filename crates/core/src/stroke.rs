//! Stroke data model
//!
//! Strokes are captured in page-local logical pixel space (already
//! DPI/scale corrected) and are append-only while a pointer is down.
//! Once committed to a page they are immutable except for full-list
//! replacement or wholesale reload.

use serde::{Deserialize, Serialize};

/// One sampled input event.
///
/// Immutable once created. Coordinates are logical pixels in the page's
/// upright orientation; pressure is normalized to 0.0–1.0; tilt is in
/// degrees (0 when the device does not report it); the timestamp is
/// monotonic milliseconds from the input source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
    pub timestamp: f64,
}

impl InputPoint {
    /// Pressure reported for devices without a pressure axis.
    pub const DEFAULT_PRESSURE: f32 = 0.5;

    /// Create a point with explicit pressure and tilt.
    pub fn new(x: f32, y: f32, pressure: f32, tilt_x: f32, tilt_y: f32, timestamp: f64) -> Self {
        Self { x, y, pressure, tilt_x, tilt_y, timestamp }
    }

    /// Create a point for a device without pressure or tilt axes.
    pub fn plain(x: f32, y: f32, timestamp: f64) -> Self {
        Self::new(x, y, Self::DEFAULT_PRESSURE, 0.0, 0.0, timestamp)
    }

    /// Distance to another point, in logical pixels.
    pub fn distance_to(&self, other: &InputPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The tool a stroke was drawn with.
///
/// `Hand` is a view-only tool: it never produces strokes and must never
/// appear in a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Highlighter,
    Eraser,
    Hand,
}

impl Tool {
    /// Whether this tool produces strokes at all.
    pub fn is_drawing(self) -> bool {
        !matches!(self, Tool::Hand)
    }

    /// Whether this tool removes ink rather than adding it.
    pub fn erases(self) -> bool {
        matches!(self, Tool::Eraser)
    }
}

/// A `#rrggbb` color.
///
/// Stored canonically in lowercase. Parsing is lenient at the API
/// boundary: an unparseable string falls back to the default ink color
/// so a bad host-supplied value never aborts a stroke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

/// Fallback ink color for unparseable input.
const DEFAULT_INK: &str = "#000000";

impl HexColor {
    /// Parse a `#rrggbb` string, canonicalizing to lowercase.
    pub fn parse(s: &str) -> Option<Self> {
        let body = s.strip_prefix('#')?;
        if body.len() != 6 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("#{}", body.to_ascii_lowercase())))
    }

    /// Parse leniently, substituting the default ink color on failure.
    pub fn parse_lossy(s: &str) -> Self {
        match Self::parse(s) {
            Some(color) => color,
            None => {
                tracing::warn!(input = s, "unparseable color, using default ink");
                Self::black()
            }
        }
    }

    pub fn black() -> Self {
        Self(DEFAULT_INK.to_string())
    }

    /// Decode to 8-bit RGB channels.
    ///
    /// Lenient: a malformed value (possible via deserialization of a
    /// hand-edited sidecar) decodes as the default ink color.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let parse = |range| u8::from_str_radix(self.0.get(range).unwrap_or("00"), 16).ok();
        match (parse(1..3), parse(3..5), parse(5..7)) {
            (Some(r), Some(g), Some(b)) if self.0.len() == 7 && self.0.starts_with('#') => {
                (r, g, b)
            }
            _ => (0, 0, 0),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::black()
    }
}

/// One continuous pointer-down-to-pointer-up drawing action.
///
/// Point order is insertion order is temporal order is render order.
/// A stroke with zero points is invalid and must never be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub points: Vec<InputPoint>,
    pub tool: Tool,
    pub color: HexColor,
    /// Line width in logical pixels, resolved once when the stroke
    /// started (from the down event's pressure for the pen).
    pub line_width: f32,
}

impl Stroke {
    /// Start an empty stroke with resolved style.
    pub fn new(tool: Tool, color: HexColor, line_width: f32) -> Self {
        Self { points: Vec::new(), tool, color, line_width }
    }

    pub fn push(&mut self, point: InputPoint) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Per-tool stroke styling defaults.
///
/// Passed explicitly at engine construction; there is no process-global
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Pen width at zero pressure, logical pixels.
    pub pen_min_width: f32,
    /// Pen width at full pressure, logical pixels.
    pub pen_max_width: f32,
    /// Fixed highlighter width, logical pixels.
    pub highlighter_width: f32,
    /// Highlighter stroke opacity (0.0–1.0).
    pub highlighter_opacity: f32,
    /// Fixed eraser width, logical pixels.
    pub eraser_width: f32,
    /// Ink color for newly started strokes.
    pub default_color: HexColor,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            pen_min_width: 1.0,
            pen_max_width: 4.0,
            highlighter_width: 20.0,
            highlighter_opacity: 0.3,
            eraser_width: 30.0,
            default_color: HexColor::black(),
        }
    }
}

impl ToolConfig {
    /// Resolve the line width for a tool at a given pressure.
    ///
    /// Pure function: the pen interpolates linearly between its minimum
    /// and maximum width by pressure (clamped to 0.0–1.0); highlighter
    /// and eraser widths are fixed. `Hand` does not draw and resolves
    /// to zero.
    pub fn line_width(&self, tool: Tool, pressure: f32) -> f32 {
        match tool {
            Tool::Pen => {
                let t = pressure.clamp(0.0, 1.0);
                self.pen_min_width + (self.pen_max_width - self.pen_min_width) * t
            }
            Tool::Highlighter => self.highlighter_width,
            Tool::Eraser => self.eraser_width,
            Tool::Hand => 0.0,
        }
    }

    /// Stroke opacity for a tool (only the highlighter is translucent).
    pub fn opacity(&self, tool: Tool) -> f32 {
        match tool {
            Tool::Highlighter => self.highlighter_opacity,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = InputPoint::plain(0.0, 0.0, 0.0);
        let b = InputPoint::plain(3.0, 4.0, 1.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_default_pressure() {
        let point = InputPoint::plain(1.0, 2.0, 0.0);
        assert_eq!(point.pressure, 0.5);
        assert_eq!(point.tilt_x, 0.0);
        assert_eq!(point.tilt_y, 0.0);
    }

    #[test]
    fn test_hex_color_parse() {
        let color = HexColor::parse("#FF8000").unwrap();
        assert_eq!(color.as_str(), "#ff8000");
        assert_eq!(color.rgb(), (255, 128, 0));

        assert!(HexColor::parse("ff8000").is_none());
        assert!(HexColor::parse("#ff80").is_none());
        assert!(HexColor::parse("#gg8000").is_none());
    }

    #[test]
    fn test_hex_color_lossy_fallback() {
        let color = HexColor::parse_lossy("not-a-color");
        assert_eq!(color, HexColor::black());
    }

    #[test]
    fn test_pen_width_monotone_in_pressure() {
        let config = ToolConfig::default();

        let mut last = config.line_width(Tool::Pen, 0.0);
        for step in 1..=10 {
            let width = config.line_width(Tool::Pen, step as f32 / 10.0);
            assert!(width >= last, "width must be non-decreasing in pressure");
            last = width;
        }

        assert!(config.line_width(Tool::Pen, 1.0) > config.line_width(Tool::Pen, 0.0));
    }

    #[test]
    fn test_pen_width_endpoints_and_clamping() {
        let config = ToolConfig::default();
        assert_eq!(config.line_width(Tool::Pen, 0.0), config.pen_min_width);
        assert_eq!(config.line_width(Tool::Pen, 1.0), config.pen_max_width);
        // Out-of-range pressure clamps rather than extrapolating.
        assert_eq!(config.line_width(Tool::Pen, 2.0), config.pen_max_width);
        assert_eq!(config.line_width(Tool::Pen, -1.0), config.pen_min_width);
    }

    #[test]
    fn test_fixed_widths_ignore_pressure() {
        let config = ToolConfig::default();
        assert_eq!(config.line_width(Tool::Highlighter, 0.1), 20.0);
        assert_eq!(config.line_width(Tool::Highlighter, 0.9), 20.0);
        assert_eq!(config.line_width(Tool::Eraser, 0.1), 30.0);
        assert_eq!(config.line_width(Tool::Eraser, 0.9), 30.0);
    }

    #[test]
    fn test_opacity_per_tool() {
        let config = ToolConfig::default();
        assert_eq!(config.opacity(Tool::Pen), 1.0);
        assert_eq!(config.opacity(Tool::Eraser), 1.0);
        assert!((config.opacity(Tool::Highlighter) - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wire_field_names() {
        let mut stroke = Stroke::new(Tool::Pen, HexColor::parse("#112233").unwrap(), 2.5);
        stroke.push(InputPoint::new(1.0, 2.0, 0.75, 10.0, -5.0, 42.0));

        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["tool"], "pen");
        assert_eq!(json["color"], "#112233");
        assert_eq!(json["lineWidth"], 2.5);
        assert_eq!(json["points"][0]["tiltX"], 10.0);
        assert_eq!(json["points"][0]["tiltY"], -5.0);
        assert_eq!(json["points"][0]["pressure"], 0.75);
    }

    #[test]
    fn test_tool_wire_names() {
        assert_eq!(serde_json::to_value(Tool::Highlighter).unwrap(), "highlighter");
        assert_eq!(serde_json::to_value(Tool::Eraser).unwrap(), "eraser");
        let tool: Tool = serde_json::from_str("\"pen\"").unwrap();
        assert_eq!(tool, Tool::Pen);
    }
}

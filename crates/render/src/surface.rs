//! DPR-aware raster drawing surface
//!
//! Wraps a CPU pixmap sized `width*dpr × height*dpr` physical pixels
//! but addressed in `width × height` logical pixels; every public
//! coordinate and line width is logical and scaled internally. The ink
//! engine draws strokes here; the page raster lives on its own surface
//! so erasing can never touch page content.

use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Transform,
};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// No drawing surface could be allocated for the requested size.
    #[error("no drawing surface available for {width}x{height} at dpr {dpr}")]
    Unavailable { width: f32, height: f32, dpr: f32 },
    /// Raw pixel upload with mismatched dimensions.
    #[error("pixel buffer length {got} does not match surface ({expected})")]
    PixelSizeMismatch { got: usize, expected: usize },
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// How a drawing operation combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Normal source-over painting.
    Over,
    /// Alpha erase: removes existing pixels where the source covers.
    Erase,
}

impl CompositeMode {
    fn blend(self) -> BlendMode {
        match self {
            CompositeMode::Over => BlendMode::SourceOver,
            CompositeMode::Erase => BlendMode::DestinationOut,
        }
    }
}

/// A frozen copy of a surface's pixels, restorable in one pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: Vec<u8>,
    physical_width: u32,
    physical_height: u32,
}

/// CPU raster surface with logical-pixel addressing.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
    width: f32,
    height: f32,
    dpr: f32,
}

impl Surface {
    /// Allocate a transparent surface.
    ///
    /// Fails with [`SurfaceError::Unavailable`] when no backing pixmap
    /// can be obtained (zero or overflowing dimensions); callers must
    /// not proceed without a surface.
    pub fn new(width: f32, height: f32, dpr: f32) -> SurfaceResult<Self> {
        let physical_width = (width * dpr).round() as i64;
        let physical_height = (height * dpr).round() as i64;
        let pixmap = u32::try_from(physical_width)
            .ok()
            .zip(u32::try_from(physical_height).ok())
            .and_then(|(w, h)| Pixmap::new(w, h))
            .ok_or(SurfaceError::Unavailable { width, height, dpr })?;

        Ok(Self { pixmap, width, height, dpr })
    }

    /// Logical width in pixels.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Logical height in pixels.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    pub fn physical_width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn physical_height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Blank the surface to full transparency.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Reallocate at a new logical size. Contents are blanked; the
    /// caller is responsible for redrawing at the new geometry.
    pub fn resize(&mut self, width: f32, height: f32) -> SurfaceResult<()> {
        *self = Self::new(width, height, self.dpr)?;
        Ok(())
    }

    fn paint(rgb: (u8, u8, u8), opacity: f32, mode: CompositeMode) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        paint.set_color_rgba8(rgb.0, rgb.1, rgb.2, alpha);
        paint.anti_alias = true;
        paint.blend_mode = mode.blend();
        paint
    }

    /// Paint a filled dot, logical center and radius.
    pub fn fill_dot(
        &mut self,
        center: (f32, f32),
        radius: f32,
        rgb: (u8, u8, u8),
        opacity: f32,
        mode: CompositeMode,
    ) {
        let dpr = self.dpr;
        let Some(path) =
            PathBuilder::from_circle(center.0 * dpr, center.1 * dpr, (radius * dpr).max(0.1))
        else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(rgb, opacity, mode),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Stroke a straight segment, logical endpoints and width.
    pub fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        rgb: (u8, u8, u8),
        opacity: f32,
        mode: CompositeMode,
    ) {
        let dpr = self.dpr;
        let mut builder = PathBuilder::new();
        builder.move_to(from.0 * dpr, from.1 * dpr);
        builder.line_to(to.0 * dpr, to.1 * dpr);
        self.stroke_path(builder, width, rgb, opacity, mode);
    }

    /// Stroke a quadratic curve from `from` to `to` with control point
    /// `ctrl`, logical coordinates and width.
    pub fn stroke_quad(
        &mut self,
        from: (f32, f32),
        ctrl: (f32, f32),
        to: (f32, f32),
        width: f32,
        rgb: (u8, u8, u8),
        opacity: f32,
        mode: CompositeMode,
    ) {
        let dpr = self.dpr;
        let mut builder = PathBuilder::new();
        builder.move_to(from.0 * dpr, from.1 * dpr);
        builder.quad_to(ctrl.0 * dpr, ctrl.1 * dpr, to.0 * dpr, to.1 * dpr);
        self.stroke_path(builder, width, rgb, opacity, mode);
    }

    fn stroke_path(
        &mut self,
        builder: PathBuilder,
        width: f32,
        rgb: (u8, u8, u8),
        opacity: f32,
        mode: CompositeMode,
    ) {
        let Some(path) = builder.finish() else { return };
        let stroke = tiny_skia::Stroke {
            width: (width * self.dpr).max(0.1),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(rgb, opacity, mode),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    /// Freeze the current pixel state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.pixmap.data().to_vec(),
            physical_width: self.pixmap.width(),
            physical_height: self.pixmap.height(),
        }
    }

    /// Restore pixels from a snapshot taken on this surface.
    ///
    /// No-op if the surface has been resized since the snapshot was
    /// taken (the snapshot is stale geometry at that point).
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if snapshot.physical_width != self.pixmap.width()
            || snapshot.physical_height != self.pixmap.height()
        {
            return;
        }
        self.pixmap.data_mut().copy_from_slice(&snapshot.data);
    }

    /// Composite another surface of identical geometry on top of this
    /// one in a single source-over pass at the given opacity.
    pub fn composite(&mut self, other: &Surface, opacity: f32) {
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            blend_mode: BlendMode::SourceOver,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, other.pixmap.as_ref(), &paint, Transform::identity(), None);
    }

    /// Replace the surface contents with straight (non-premultiplied)
    /// RGBA bytes, e.g. a rasterized page from the PDF backend.
    pub fn put_rgba(&mut self, rgba: &[u8]) -> SurfaceResult<()> {
        let expected = self.pixmap.width() as usize * self.pixmap.height() as usize * 4;
        if rgba.len() != expected {
            return Err(SurfaceError::PixelSizeMismatch { got: rgba.len(), expected });
        }
        for (pixel, chunk) in self.pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            *pixel = ColorU8::from_rgba(chunk[0], chunk[1], chunk[2], chunk[3]).premultiply();
        }
        Ok(())
    }

    /// Premultiplied RGBA pixel at physical coordinates, for readback.
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        self.pixmap.pixel(x, y).map(|p| (p.red(), p.green(), p.blue(), p.alpha()))
    }

    /// Raw premultiplied RGBA bytes.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }
}

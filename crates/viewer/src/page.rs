//! Per-page mount state
//!
//! Each page moves through `Unmounted → Placeholder → Rendered` and
//! back. Only rendered pages hold a raster surface and a stroke
//! engine, which bounds memory and CPU for large documents: an
//! off-screen page costs one geometry record.

use pdf_ink_render::geometry::PageGeometry;
use pdf_ink_render::surface::Surface;
use pdf_ink_ui::engine::StrokeCanvasEngine;

/// Lifecycle state of a page in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// No slot exists for the page.
    Unmounted,
    /// Geometry known, placeholder box laid out, nothing rendered.
    Placeholder,
    /// Raster and ink layers are live.
    Rendered,
}

/// A mounted page: geometry always, raster and engine only while
/// rendered.
pub(crate) struct PageSlot {
    pub(crate) geometry: PageGeometry,
    pub(crate) raster: Option<Surface>,
    pub(crate) engine: Option<StrokeCanvasEngine>,
}

impl PageSlot {
    pub(crate) fn placeholder(geometry: PageGeometry) -> Self {
        Self { geometry, raster: None, engine: None }
    }

    pub(crate) fn state(&self) -> PageState {
        if self.engine.is_some() { PageState::Rendered } else { PageState::Placeholder }
    }

    /// Drop the rendered layers, returning to placeholder. The caller
    /// must have flushed the engine's strokes first.
    pub(crate) fn demote(&mut self) {
        self.engine = None;
        self.raster = None;
    }
}

//! Host capability interface
//!
//! The coordinator never reaches into host internals; everything it
//! needs from the embedding application is declared here as explicit
//! capabilities.

use pdf_ink_render::surface::Surface;
use std::path::Path;

/// Pre-load margin as a fraction of viewport height. The host registers
/// page elements with this margin so intersection callbacks arrive
/// slightly before a page scrolls into view.
pub const PRELOAD_MARGIN: f32 = 0.5;

/// What the host view exposes to the annotation layer.
pub trait HostView {
    /// Vault-relative path of the source document.
    fn document_path(&self) -> &Path;

    /// Receive a page's composited layers for display: the raster
    /// below, the ink above. Called whenever a rendered page's pixels
    /// change.
    fn present(&mut self, page_number: u32, raster: &Surface, ink: &Surface);
}

/// Registration half of the visibility contract.
///
/// The host observes page elements and reports viewport intersection
/// asynchronously through
/// [`PageRenderCoordinator::on_visibility`](crate::PageRenderCoordinator::on_visibility),
/// honoring [`PRELOAD_MARGIN`].
pub trait VisibilityNotifier {
    fn observe(&mut self, page_number: u32);
    fn unobserve(&mut self, page_number: u32);
}

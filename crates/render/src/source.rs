//! External PDF raster source contract
//!
//! The annotation layer never parses PDF structure itself: given a page
//! number, a scale, and a rotation override, the raster source draws
//! the page into a caller-provided surface and reports page geometry.

use crate::geometry::PageGeometry;
use crate::surface::{Surface, SurfaceError};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("page {0} does not exist")]
    InvalidPage(u32),
    #[error("render backend error: {0}")]
    Backend(String),
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for raster-source operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Renders document pages into caller-provided surfaces.
///
/// Page numbers are 1-based. `render_page` draws the full page scaled
/// by `scale` (logical pixels per point), rotated clockwise by
/// `rotation_override`, into `target`, which the caller has sized to
/// the scaled, rotation-corrected page geometry.
pub trait PageRasterSource {
    fn page_count(&self) -> u32;

    fn page_geometry(&self, page_number: u32) -> RasterResult<PageGeometry>;

    fn render_page(
        &self,
        page_number: u32,
        scale: f32,
        rotation_override: crate::geometry::PageRotation,
        target: &mut Surface,
    ) -> RasterResult<()>;
}

//! PDF Ink Render Library
//!
//! Drawing surfaces, page geometry, and the external raster-source
//! contract the annotation layer composites over.

pub mod geometry;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod source;
pub mod surface;

pub use geometry::{rotate_rgba, PageGeometry, PageRotation};
#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumRasterSource, PdfiumSourceConfig};
pub use source::{PageRasterSource, RasterError, RasterResult};
pub use surface::{CompositeMode, Snapshot, Surface, SurfaceError, SurfaceResult};

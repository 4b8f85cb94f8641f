//! PDFium-backed raster source
//!
//! Binds the PDFium library at a configured location and renders pages
//! through it. PDFium bakes each page's `/Rotate` entry into both its
//! reported size and its rendered output, so pages come back already
//! upright and the reported intrinsic rotation is zero; a rotation
//! override is still honored by rotating the returned pixels.

use crate::geometry::{rotate_rgba, PageGeometry, PageRotation};
use crate::source::{PageRasterSource, RasterError, RasterResult};
use crate::surface::Surface;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Where to find the PDFium dynamic library.
///
/// Passed explicitly at construction; there is no process-global
/// configuration. With no `library_path`, the executable's directory is
/// tried first (app bundle layout), then the system library paths.
#[derive(Debug, Clone, Default)]
pub struct PdfiumSourceConfig {
    /// Directory containing the platform PDFium library, if pinned.
    pub library_path: Option<PathBuf>,
    /// Skip the executable-directory probe and bind the system library
    /// directly.
    pub prefer_system_library: bool,
}

/// Raster source backed by a PDFium-loaded document.
pub struct PdfiumRasterSource {
    document: PdfDocument<'static>,
}

impl PdfiumRasterSource {
    fn bind(config: &PdfiumSourceConfig) -> RasterResult<Pdfium> {
        if let Some(ref dir) = config.library_path {
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .map_err(|e| RasterError::Backend(e.to_string()))?;
            return Ok(Pdfium::new(bindings));
        }

        if !config.prefer_system_library {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(ref dir) = exe_dir {
                if let Ok(bindings) =
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                {
                    return Ok(Pdfium::new(bindings));
                }
            }
        }

        Ok(Pdfium::new(
            Pdfium::bind_to_system_library().map_err(|e| RasterError::Backend(e.to_string()))?,
        ))
    }

    /// Open a document from a file path.
    pub fn open<P: AsRef<Path>>(path: P, config: &PdfiumSourceConfig) -> RasterResult<Self> {
        let pdfium = Box::leak(Box::new(Self::bind(config)?));
        let document = pdfium
            .load_pdf_from_file(path.as_ref(), None)
            .map_err(|e| RasterError::Backend(e.to_string()))?;
        Ok(Self { document })
    }

    /// Open a document from bytes (e.g. read through the host vault).
    pub fn from_bytes(data: Vec<u8>, config: &PdfiumSourceConfig) -> RasterResult<Self> {
        let pdfium = Box::leak(Box::new(Self::bind(config)?));
        let data_static: &'static [u8] = Box::leak(data.into_boxed_slice());
        let document = pdfium
            .load_pdf_from_byte_slice(data_static, None)
            .map_err(|e| RasterError::Backend(e.to_string()))?;
        Ok(Self { document })
    }

    fn page(&self, page_number: u32) -> RasterResult<PdfPage<'_>> {
        let index = page_number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or(RasterError::InvalidPage(page_number))?;
        self.document.pages().get(index).map_err(|_| RasterError::InvalidPage(page_number))
    }
}

impl PageRasterSource for PdfiumRasterSource {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn page_geometry(&self, page_number: u32) -> RasterResult<PageGeometry> {
        let page = self.page(page_number)?;
        Ok(PageGeometry::new(page.width().value, page.height().value, PageRotation::Deg0))
    }

    fn render_page(
        &self,
        page_number: u32,
        _scale: f32,
        rotation_override: PageRotation,
        target: &mut Surface,
    ) -> RasterResult<()> {
        let page = self.page(page_number)?;

        // Render in the raw orientation at the target's physical
        // density, then rotate into the target.
        let (raw_width, raw_height) = if rotation_override.is_sideways() {
            (target.physical_height(), target.physical_width())
        } else {
            (target.physical_width(), target.physical_height())
        };

        let config = PdfRenderConfig::new()
            .set_target_width(raw_width as i32)
            .set_target_height(raw_height as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RasterError::Backend(e.to_string()))?;
        let rgba = bitmap.as_rgba_bytes().to_vec();

        let (rotated, _, _) = rotate_rgba(&rgba, raw_width, raw_height, rotation_override);
        target.put_rgba(&rotated)?;
        Ok(())
    }
}

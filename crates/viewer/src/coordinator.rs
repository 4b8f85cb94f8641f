//! Page render coordination
//!
//! Owns one stroke canvas engine per rendered page and drives the lazy
//! mount cycle from visibility callbacks. On zoom or rotation changes
//! every rendered page flushes its strokes, drops its layers, and is
//! recreated at the new geometry.
//!
//! Strokes cross the flush/reload boundary in normalized page-fraction
//! coordinates (0..1 of the upright logical page size), so annotations
//! saved at one zoom level align when reloaded at another. Engines
//! always work in surface-local logical pixels.

use crate::host::HostView;
use crate::page::{PageSlot, PageState};
use pdf_ink_core::document::PageAnnotationSet;
use pdf_ink_core::persistence::{self, PersistenceError};
use pdf_ink_core::stroke::{HexColor, Stroke, Tool, ToolConfig};
use pdf_ink_core::vault::Vault;
use pdf_ink_render::source::{PageRasterSource, RasterError};
use pdf_ink_render::surface::{Surface, SurfaceError};
use pdf_ink_ui::engine::{EngineError, StrokeCanvasEngine};
use pdf_ink_ui::input::PointerEvent;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("page {0} does not exist")]
    InvalidPage(u32),
    #[error("raster source error: {0}")]
    Raster(#[from] RasterError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Viewer-wide rendering parameters.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Logical pixels per PDF point.
    pub scale: f32,
    pub device_pixel_ratio: f32,
    pub tools: ToolConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { scale: 1.0, device_pixel_ratio: 1.0, tools: ToolConfig::default() }
    }
}

/// Scale stroke coordinates from logical pixels to page fractions.
fn normalize_strokes(mut strokes: Vec<Stroke>, width: f32, height: f32) -> Vec<Stroke> {
    for stroke in &mut strokes {
        for point in &mut stroke.points {
            point.x /= width;
            point.y /= height;
        }
    }
    strokes
}

/// Scale stroke coordinates from page fractions to logical pixels.
fn denormalize_strokes(strokes: &[Stroke], width: f32, height: f32) -> Vec<Stroke> {
    let mut strokes = strokes.to_vec();
    for stroke in &mut strokes {
        for point in &mut stroke.points {
            point.x *= width;
            point.y *= height;
        }
    }
    strokes
}

/// One coordinator per open document.
///
/// All calls run on the host event loop; the page annotation set is
/// mutated only by engines flushing into their page slot and by a load
/// replacing the whole set.
pub struct PageRenderCoordinator<R: PageRasterSource> {
    source: R,
    pdf_path: PathBuf,
    scale: f32,
    device_pixel_ratio: f32,
    tools: ToolConfig,
    tool: Tool,
    color: HexColor,
    slots: BTreeMap<u32, PageSlot>,
    annotations: PageAnnotationSet,
}

impl<R: PageRasterSource> PageRenderCoordinator<R> {
    pub fn new(source: R, pdf_path: impl Into<PathBuf>, config: CoordinatorConfig) -> Self {
        let color = config.tools.default_color.clone();
        Self {
            source,
            pdf_path: pdf_path.into(),
            scale: config.scale,
            device_pixel_ratio: config.device_pixel_ratio,
            tools: config.tools,
            tool: Tool::Pen,
            color,
            slots: BTreeMap::new(),
            annotations: PageAnnotationSet::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn state_of(&self, page_number: u32) -> PageState {
        self.slots.get(&page_number).map(PageSlot::state).unwrap_or(PageState::Unmounted)
    }

    /// The page's size in logical pixels at the current scale, in the
    /// corrected (upright) orientation. Hosts size placeholder boxes
    /// with this.
    pub fn page_logical_size(&self, page_number: u32) -> Option<(f32, f32)> {
        let slot = self.slots.get(&page_number)?;
        let (width, height) = slot.geometry.upright_size();
        Some((width * self.scale, height * self.scale))
    }

    /// The full per-page stroke mapping (rendered pages may hold newer
    /// strokes not yet flushed; see [`Self::save_annotations`]).
    pub fn annotations(&self) -> &PageAnnotationSet {
        &self.annotations
    }

    /// Mount a page as a placeholder. Idempotent and keyed by page
    /// number: any trigger may call it redundantly, the current state
    /// decides whether anything happens.
    pub fn ensure_mounted(&mut self, page_number: u32) -> CoordinatorResult<()> {
        if self.slots.contains_key(&page_number) {
            return Ok(());
        }
        if page_number < 1 || page_number > self.source.page_count() {
            return Err(CoordinatorError::InvalidPage(page_number));
        }
        let geometry = self.source.page_geometry(page_number)?;
        self.slots.insert(page_number, PageSlot::placeholder(geometry));
        debug!(page = page_number, "page mounted as placeholder");
        Ok(())
    }

    /// Visibility callback from the host's notifier. An intersecting
    /// page is rendered (the notifier's pre-load margin means this
    /// fires slightly before the page is visible); a page leaving the
    /// margin flushes its strokes and returns to placeholder.
    pub fn on_visibility(
        &mut self,
        page_number: u32,
        is_intersecting: bool,
        _intersection_ratio: f32,
    ) -> CoordinatorResult<()> {
        if is_intersecting {
            self.render_page(page_number)
        } else {
            if self.state_of(page_number) == PageState::Rendered {
                self.flush_and_demote(page_number);
            }
            Ok(())
        }
    }

    /// Bring a page to the rendered state: rasterize it upright at the
    /// current scale and attach a stroke engine loaded with the page's
    /// saved strokes. Idempotent.
    pub fn render_page(&mut self, page_number: u32) -> CoordinatorResult<()> {
        self.ensure_mounted(page_number)?;
        if self.state_of(page_number) == PageState::Rendered {
            return Ok(());
        }

        let Some(geometry) = self.slots.get(&page_number).map(|slot| slot.geometry) else {
            return Err(CoordinatorError::InvalidPage(page_number));
        };
        let (upright_width, upright_height) = geometry.upright_size();
        let width = upright_width * self.scale;
        let height = upright_height * self.scale;

        let mut raster = Surface::new(width, height, self.device_pixel_ratio)?;
        self.source.render_page(
            page_number,
            self.scale,
            geometry.rotation.inverse(),
            &mut raster,
        )?;

        let mut engine =
            StrokeCanvasEngine::new(width, height, self.device_pixel_ratio, self.tools.clone())?;
        engine.set_tool(self.tool);
        engine.set_color(self.color.clone());
        engine.load_strokes(denormalize_strokes(
            self.annotations.strokes_for(page_number),
            width,
            height,
        ))?;

        if let Some(slot) = self.slots.get_mut(&page_number) {
            slot.raster = Some(raster);
            slot.engine = Some(engine);
        }
        debug!(page = page_number, width, height, "page rendered");
        Ok(())
    }

    /// Flush a rendered page's strokes into the annotation set and drop
    /// its layers. In-progress strokes are discarded, never partially
    /// committed.
    fn flush_and_demote(&mut self, page_number: u32) {
        let Some(slot) = self.slots.get_mut(&page_number) else { return };
        let Some(engine) = slot.engine.as_mut() else { return };

        let (width, height) = (engine.width(), engine.height());
        let strokes = normalize_strokes(engine.take_strokes(), width, height);
        self.annotations.replace_page(page_number, strokes);
        slot.demote();
        debug!(page = page_number, "page demoted to placeholder");
    }

    /// Copy every rendered page's committed strokes into the set
    /// without tearing the pages down.
    fn flush_rendered(&mut self) {
        let mut flushed: Vec<(u32, Vec<Stroke>)> = Vec::new();
        for (&page_number, slot) in &self.slots {
            if let Some(engine) = slot.engine.as_ref() {
                let strokes =
                    normalize_strokes(engine.strokes().to_vec(), engine.width(), engine.height());
                flushed.push((page_number, strokes));
            }
        }
        for (page_number, strokes) in flushed {
            self.annotations.replace_page(page_number, strokes);
        }
    }

    /// Change the rendering scale (zoom). Every rendered page flushes
    /// its strokes, is destroyed, and is recreated at the new pixel
    /// geometry with its strokes reloaded.
    pub fn set_scale(&mut self, scale: f32) -> CoordinatorResult<()> {
        if scale <= 0.0 || (scale - self.scale).abs() < f32::EPSILON {
            return Ok(());
        }

        let rendered: Vec<u32> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.state() == PageState::Rendered)
            .map(|(&page, _)| page)
            .collect();

        for &page_number in &rendered {
            self.flush_and_demote(page_number);
        }
        debug!(from = self.scale, to = scale, pages = rendered.len(), "rescaling viewer");
        self.scale = scale;
        for page_number in rendered {
            self.render_page(page_number)?;
        }
        Ok(())
    }

    /// Select the active tool on every live engine. The hand tool makes
    /// surfaces transparent to pointer input so the host can pan.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        for slot in self.slots.values_mut() {
            if let Some(engine) = slot.engine.as_mut() {
                engine.set_tool(tool);
            }
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Set the ink color for strokes started from now on.
    pub fn set_color(&mut self, color: HexColor) {
        self.color = color.clone();
        for slot in self.slots.values_mut() {
            if let Some(engine) = slot.engine.as_mut() {
                engine.set_color(color.clone());
            }
        }
    }

    fn engine_mut(&mut self, page_number: u32) -> Option<&mut StrokeCanvasEngine> {
        self.slots.get_mut(&page_number).and_then(|slot| slot.engine.as_mut())
    }

    /// Route pointer events to a page's engine. Events for pages that
    /// are not rendered are dropped; pages are independent and carry no
    /// cross-page ordering guarantee.
    pub fn on_pointer_down(&mut self, page_number: u32, event: &PointerEvent) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.on_pointer_down(event);
        }
    }

    pub fn on_pointer_move(&mut self, page_number: u32, event: &PointerEvent) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.on_pointer_move(event);
        }
    }

    pub fn on_pointer_up(&mut self, page_number: u32, event: &PointerEvent) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.on_pointer_up(event);
        }
    }

    pub fn on_pointer_leave(&mut self, page_number: u32) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.on_pointer_leave();
        }
    }

    pub fn on_pointer_cancel(&mut self, page_number: u32) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.on_pointer_cancel();
        }
    }

    /// Whether any engine has a composite pass waiting on the next
    /// display refresh.
    pub fn needs_frame(&self) -> bool {
        self.slots.values().any(|slot| {
            slot.engine.as_ref().map(StrokeCanvasEngine::needs_frame).unwrap_or(false)
        })
    }

    /// Display-refresh tick: run pending composite passes.
    pub fn on_frame(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(engine) = slot.engine.as_mut() {
                engine.on_frame();
            }
        }
    }

    /// Discard a rendered page's strokes entirely.
    pub fn clear_page(&mut self, page_number: u32) {
        if let Some(engine) = self.engine_mut(page_number) {
            engine.clear();
        }
        self.annotations.replace_page(page_number, Vec::new());
    }

    /// Flush all rendered pages, then write the sidecar (deleting it
    /// when nothing remains). I/O failures propagate to the caller for
    /// a user-visible, non-blocking notification.
    pub fn save_annotations(&mut self, vault: &mut dyn Vault) -> CoordinatorResult<()> {
        self.flush_rendered();
        persistence::save(vault, &self.pdf_path, &self.annotations)?;
        Ok(())
    }

    /// Replace the whole set from the sidecar (missing or unreadable
    /// loads as empty) and reload every rendered engine from it.
    pub fn load_annotations(&mut self, vault: &dyn Vault) -> CoordinatorResult<()> {
        self.annotations = persistence::load(vault, &self.pdf_path);

        let rendered: Vec<(u32, f32, f32)> = self
            .slots
            .iter()
            .filter_map(|(&page, slot)| {
                slot.engine.as_ref().map(|e| (page, e.width(), e.height()))
            })
            .collect();
        for (page_number, width, height) in rendered {
            let strokes =
                denormalize_strokes(self.annotations.strokes_for(page_number), width, height);
            if let Some(engine) = self.engine_mut(page_number) {
                engine.load_strokes(strokes)?;
            }
        }
        Ok(())
    }

    /// Tear down every page: flush strokes, drop layers and slots.
    /// Called when the view closes; pair with a final
    /// [`Self::save_annotations`].
    pub fn unmount_all(&mut self) {
        let pages: Vec<u32> = self.slots.keys().copied().collect();
        for page_number in pages {
            self.flush_and_demote(page_number);
        }
        self.slots.clear();
    }

    /// Push every rendered page's layers to the host for display.
    pub fn present(&self, host: &mut dyn HostView) {
        for (&page_number, slot) in &self.slots {
            if let (Some(raster), Some(engine)) = (slot.raster.as_ref(), slot.engine.as_ref()) {
                host.present(page_number, raster, engine.surface());
            }
        }
    }
}

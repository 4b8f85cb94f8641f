//! End-to-end annotation flow: mount, draw, zoom, save, reload.

use pdf_ink_core::stroke::Tool;
use pdf_ink_core::vault::{DiskVault, Vault};
use pdf_ink_core::{persistence, MemoryVault};
use pdf_ink_render::geometry::{PageGeometry, PageRotation};
use pdf_ink_render::source::{PageRasterSource, RasterError, RasterResult};
use pdf_ink_render::surface::Surface;
use pdf_ink_ui::input::PointerEvent;
use pdf_ink_viewer::{
    CoordinatorConfig, HostView, PageRenderCoordinator, PageState,
};
use std::path::Path;

/// Plain white pages, enough to exercise the full pipeline.
struct WhiteSource {
    pages: u32,
    page_size: (f32, f32),
}

impl PageRasterSource for WhiteSource {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn page_geometry(&self, page_number: u32) -> RasterResult<PageGeometry> {
        if page_number < 1 || page_number > self.pages {
            return Err(RasterError::InvalidPage(page_number));
        }
        Ok(PageGeometry::new(self.page_size.0, self.page_size.1, PageRotation::Deg0))
    }

    fn render_page(
        &self,
        page_number: u32,
        _scale: f32,
        _rotation_override: PageRotation,
        target: &mut Surface,
    ) -> RasterResult<()> {
        self.page_geometry(page_number)?;
        let len = target.physical_width() as usize * target.physical_height() as usize * 4;
        target.put_rgba(&vec![255u8; len])?;
        Ok(())
    }
}

fn source() -> WhiteSource {
    WhiteSource { pages: 2, page_size: (100.0, 100.0) }
}

/// Captures presented layers for inspection.
#[derive(Default)]
struct CapturingHost {
    frames: Vec<(u32, Surface, Surface)>,
}

impl HostView for CapturingHost {
    fn document_path(&self) -> &Path {
        Path::new("paper.pdf")
    }

    fn present(&mut self, page_number: u32, raster: &Surface, ink: &Surface) {
        self.frames.push((page_number, raster.clone(), ink.clone()));
    }
}

fn pen_line(
    coordinator: &mut PageRenderCoordinator<WhiteSource>,
    page: u32,
    pointer: u64,
    from: (f32, f32),
    to: (f32, f32),
) {
    coordinator.on_pointer_down(page, &PointerEvent::pen(pointer, from.0, from.1, 0.7, 0.0));
    coordinator.on_pointer_move(page, &PointerEvent::pen(pointer, to.0, to.1, 0.7, 8.0));
    coordinator.on_pointer_up(page, &PointerEvent::pen(pointer, to.0, to.1, 0.7, 16.0));
}

#[test]
fn full_session_round_trip_across_zoom_levels() {
    let temp = tempfile::tempdir().unwrap();
    let mut vault = DiskVault::new(temp.path());

    let mut coordinator =
        PageRenderCoordinator::new(source(), "paper.pdf", CoordinatorConfig::default());

    // Page scrolls toward the viewport; the notifier reports it early.
    coordinator.on_visibility(1, true, 0.1).unwrap();
    assert_eq!(coordinator.state_of(1), PageState::Rendered);
    assert_eq!(coordinator.state_of(2), PageState::Unmounted);

    pen_line(&mut coordinator, 1, 1, (20.0, 50.0), (80.0, 50.0));

    // A highlighter pass with its frame-throttled composite.
    coordinator.set_tool(Tool::Highlighter);
    coordinator.on_pointer_down(1, &PointerEvent::pen(1, 20.0, 70.0, 0.5, 20.0));
    coordinator.on_pointer_move(1, &PointerEvent::pen(1, 80.0, 70.0, 0.5, 28.0));
    assert!(coordinator.needs_frame());
    coordinator.on_frame();
    assert!(!coordinator.needs_frame());
    coordinator.on_pointer_up(1, &PointerEvent::pen(1, 80.0, 70.0, 0.5, 36.0));

    // Zoom mid-session; strokes survive the recreate cycle.
    coordinator.set_scale(2.0).unwrap();
    assert_eq!(coordinator.page_logical_size(1), Some((200.0, 200.0)));

    coordinator.save_annotations(&mut vault).unwrap();
    coordinator.unmount_all();

    // The sidecar sits next to the document and stores page fractions.
    let sidecar = persistence::sidecar_path(Path::new("paper.pdf"));
    let json: serde_json::Value =
        serde_json::from_str(&vault.read_text(&sidecar).unwrap()).unwrap();
    assert_eq!(json["version"], "2");
    assert_eq!(json["pdfPath"], "paper.pdf");
    let strokes = json["pageAnnotations"]["1"].as_array().unwrap();
    assert_eq!(strokes.len(), 2);
    for stroke in strokes {
        for point in stroke["points"].as_array().unwrap() {
            let x = point["x"].as_f64().unwrap();
            let y = point["y"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&x), "x {x} should be a page fraction");
            assert!((0.0..=1.0).contains(&y), "y {y} should be a page fraction");
        }
    }

    // A later session at a different default scale still aligns.
    let mut reloaded = PageRenderCoordinator::new(
        source(),
        "paper.pdf",
        CoordinatorConfig { scale: 1.5, ..CoordinatorConfig::default() },
    );
    reloaded.load_annotations(&vault).unwrap();
    reloaded.on_visibility(1, true, 0.2).unwrap();

    let mut host = CapturingHost::default();
    reloaded.present(&mut host);
    assert_eq!(host.frames.len(), 1);
    let (page, _, ink) = &host.frames[0];
    assert_eq!(*page, 1);
    // The pen line drawn at y=50 on a 100px page sits at y=75 now.
    assert!(ink.pixel(75, 75).unwrap().3 > 0);
    assert_eq!(ink.pixel(10, 10).unwrap().3, 0);
}

#[test]
fn erasing_never_alters_page_content() {
    let mut coordinator =
        PageRenderCoordinator::new(source(), "paper.pdf", CoordinatorConfig::default());
    coordinator.on_visibility(1, true, 1.0).unwrap();

    let mut host = CapturingHost::default();
    coordinator.present(&mut host);
    let (_, raster_before, _) = host.frames.pop().unwrap();

    pen_line(&mut coordinator, 1, 1, (30.0, 40.0), (70.0, 40.0));
    coordinator.set_tool(Tool::Eraser);
    pen_line(&mut coordinator, 1, 1, (20.0, 40.0), (80.0, 40.0));

    let mut host = CapturingHost::default();
    coordinator.present(&mut host);
    let (_, raster_after, ink) = host.frames.pop().unwrap();

    // Only annotation-layer pixels changed.
    assert_eq!(raster_before.data(), raster_after.data());
    assert_eq!(ink.pixel(50, 40).unwrap().3, 0);

    // The composited frame shows the page exactly as before.
    let mut frame = raster_after.clone();
    frame.composite(&ink, 1.0);
    assert_eq!(frame.pixel(50, 40), raster_before.pixel(50, 40));
}

#[test]
fn clearing_all_annotations_removes_sidecar() {
    let mut vault = MemoryVault::new();
    let mut coordinator =
        PageRenderCoordinator::new(source(), "paper.pdf", CoordinatorConfig::default());
    coordinator.on_visibility(1, true, 1.0).unwrap();

    pen_line(&mut coordinator, 1, 1, (20.0, 50.0), (80.0, 50.0));
    coordinator.save_annotations(&mut vault).unwrap();
    assert!(persistence::sidecar_exists(&vault, Path::new("paper.pdf")));

    coordinator.clear_page(1);
    coordinator.save_annotations(&mut vault).unwrap();
    assert!(!persistence::sidecar_exists(&vault, Path::new("paper.pdf")));
    assert!(persistence::load(&vault, Path::new("paper.pdf")).is_empty());
}

#[test]
fn pages_capture_independently() {
    let mut coordinator =
        PageRenderCoordinator::new(source(), "paper.pdf", CoordinatorConfig::default());
    coordinator.on_visibility(1, true, 1.0).unwrap();
    coordinator.on_visibility(2, true, 1.0).unwrap();

    // Interleaved input on two pages with distinct pointers.
    coordinator.on_pointer_down(1, &PointerEvent::pen(1, 10.0, 10.0, 0.5, 0.0));
    coordinator.on_pointer_down(2, &PointerEvent::pen(2, 60.0, 60.0, 0.5, 1.0));
    coordinator.on_pointer_move(1, &PointerEvent::pen(1, 30.0, 10.0, 0.5, 2.0));
    coordinator.on_pointer_move(2, &PointerEvent::pen(2, 80.0, 60.0, 0.5, 3.0));
    coordinator.on_pointer_up(1, &PointerEvent::pen(1, 30.0, 10.0, 0.5, 4.0));
    coordinator.on_pointer_up(2, &PointerEvent::pen(2, 80.0, 60.0, 0.5, 5.0));

    coordinator.unmount_all();
    assert_eq!(coordinator.annotations().strokes_for(1).len(), 1);
    assert_eq!(coordinator.annotations().strokes_for(2).len(), 1);
    assert_eq!(coordinator.annotations().stroke_count(), 2);
}

#[test]
fn offscreen_pages_hold_no_render_resources() {
    let mut coordinator =
        PageRenderCoordinator::new(source(), "paper.pdf", CoordinatorConfig::default());
    coordinator.ensure_mounted(1).unwrap();
    coordinator.ensure_mounted(2).unwrap();
    coordinator.on_visibility(1, true, 1.0).unwrap();

    assert_eq!(coordinator.state_of(1), PageState::Rendered);
    assert_eq!(coordinator.state_of(2), PageState::Placeholder);

    let mut host = CapturingHost::default();
    coordinator.present(&mut host);
    assert_eq!(host.frames.len(), 1, "placeholder pages present nothing");
}

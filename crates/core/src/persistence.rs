//! Sidecar persistence for annotation documents
//!
//! Annotations are saved next to the source PDF as
//! `<document-path>.annotations.json`. The whole document is rewritten
//! on every save; saving an empty set deletes the sidecar instead of
//! leaving a tombstone. A missing or unreadable sidecar loads as the
//! empty set.

use crate::document::{AnnotationDocument, PageAnnotationSet, FORMAT_VERSION};
use crate::vault::{Vault, VaultError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix appended to the source document path to name its sidecar.
pub const SIDECAR_SUFFIX: &str = ".annotations.json";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Sidecar path for a source document.
///
/// The suffix is appended to the full document path, so the sidecar is
/// colocated with the PDF:
/// `notes/paper.pdf` → `notes/paper.pdf.annotations.json`.
pub fn sidecar_path(pdf_path: &Path) -> PathBuf {
    let mut name = pdf_path.to_string_lossy().into_owned();
    name.push_str(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Whether a sidecar exists for the document.
pub fn sidecar_exists(vault: &dyn Vault, pdf_path: &Path) -> bool {
    vault.exists(&sidecar_path(pdf_path))
}

/// Save the full per-page stroke mapping for a document.
///
/// An empty set deletes any existing sidecar rather than writing an
/// empty file. The vault's `write_text` contract makes the overwrite
/// atomic from the caller's perspective.
pub fn save(
    vault: &mut dyn Vault,
    pdf_path: &Path,
    set: &PageAnnotationSet,
) -> PersistenceResult<()> {
    let sidecar = sidecar_path(pdf_path);

    if set.is_empty() {
        debug!(path = %sidecar.display(), "annotation set empty, removing sidecar");
        vault.delete(&sidecar)?;
        return Ok(());
    }

    let document = AnnotationDocument::new(pdf_path.to_string_lossy(), set.clone());
    let json = serde_json::to_string_pretty(&document)?;
    vault.write_text(&sidecar, &json)?;

    debug!(
        path = %sidecar.display(),
        pages = set.page_count(),
        strokes = set.stroke_count(),
        "saved annotations"
    );
    Ok(())
}

/// Load the saved stroke mapping for a document.
///
/// A missing sidecar is a valid "no annotations" state. A sidecar that
/// fails to read or parse is treated the same way: the failure is
/// logged, never raised. Invalid strokes (zero points, non-drawing
/// tool) found in a hand-edited file are dropped.
pub fn load(vault: &dyn Vault, pdf_path: &Path) -> PageAnnotationSet {
    let sidecar = sidecar_path(pdf_path);
    if !vault.exists(&sidecar) {
        return PageAnnotationSet::new();
    }

    let json = match vault.read_text(&sidecar) {
        Ok(json) => json,
        Err(err) => {
            warn!(path = %sidecar.display(), error = %err, "failed to read sidecar");
            return PageAnnotationSet::new();
        }
    };

    let document: AnnotationDocument = match serde_json::from_str(&json) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %sidecar.display(), error = %err, "failed to parse sidecar");
            return PageAnnotationSet::new();
        }
    };

    if document.version != FORMAT_VERSION {
        // Older files stored absolute capture-scale pixels; they are
        // loaded as-is since no capture-scale record exists to migrate.
        debug!(
            path = %sidecar.display(),
            version = %document.version,
            "sidecar uses an older format version"
        );
    }

    let mut set = document.page_annotations;
    let dropped = set.sanitize();
    if dropped > 0 {
        warn!(path = %sidecar.display(), dropped, "dropped invalid strokes from sidecar");
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{HexColor, InputPoint, Stroke, Tool};
    use crate::vault::MemoryVault;

    fn sample_set() -> PageAnnotationSet {
        let mut stroke = Stroke::new(Tool::Pen, HexColor::parse("#aa0000").unwrap(), 2.5);
        stroke.push(InputPoint::new(0.1, 0.2, 0.8, 5.0, 0.0, 10.0));
        stroke.push(InputPoint::new(0.3, 0.4, 0.9, 5.0, 0.0, 18.0));

        let mut highlight = Stroke::new(Tool::Highlighter, HexColor::parse("#ffee00").unwrap(), 20.0);
        highlight.push(InputPoint::plain(0.5, 0.5, 30.0));

        let mut set = PageAnnotationSet::new();
        set.replace_page(1, vec![stroke]);
        set.replace_page(3, vec![highlight]);
        set
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("notes/paper.pdf")),
            PathBuf::from("notes/paper.pdf.annotations.json")
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut vault = MemoryVault::new();
        let pdf = Path::new("doc.pdf");
        let set = sample_set();

        save(&mut vault, pdf, &set).unwrap();
        assert!(sidecar_exists(&vault, pdf));

        let loaded = load(&vault, pdf);
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_empty_save_deletes_sidecar() {
        let mut vault = MemoryVault::new();
        let pdf = Path::new("doc.pdf");

        save(&mut vault, pdf, &sample_set()).unwrap();
        assert!(sidecar_exists(&vault, pdf));

        save(&mut vault, pdf, &PageAnnotationSet::new()).unwrap();
        assert!(!sidecar_exists(&vault, pdf));
        assert!(load(&vault, pdf).is_empty());
    }

    #[test]
    fn test_empty_save_without_prior_sidecar() {
        let mut vault = MemoryVault::new();
        save(&mut vault, Path::new("doc.pdf"), &PageAnnotationSet::new()).unwrap();
        assert!(!sidecar_exists(&vault, Path::new("doc.pdf")));
    }

    #[test]
    fn test_missing_sidecar_loads_empty() {
        let vault = MemoryVault::new();
        assert!(load(&vault, Path::new("never-saved.pdf")).is_empty());
    }

    #[test]
    fn test_corrupt_sidecar_loads_empty() {
        let mut vault = MemoryVault::new();
        let pdf = Path::new("doc.pdf");
        vault.write_text(&sidecar_path(pdf), "{not json").unwrap();

        assert!(load(&vault, pdf).is_empty());
    }

    #[test]
    fn test_load_drops_invalid_strokes() {
        let mut vault = MemoryVault::new();
        let pdf = Path::new("doc.pdf");
        // Hand-edited sidecar with an empty stroke alongside a valid one.
        let json = r##"{
            "version": "2",
            "pdfPath": "doc.pdf",
            "pageAnnotations": {
                "1": [
                    { "points": [], "tool": "pen", "color": "#000000", "lineWidth": 2.0 },
                    { "points": [{"x": 0.5, "y": 0.5, "pressure": 0.5, "tiltX": 0.0, "tiltY": 0.0, "timestamp": 1.0}],
                      "tool": "pen", "color": "#000000", "lineWidth": 2.0 }
                ]
            }
        }"##;
        vault.write_text(&sidecar_path(pdf), json).unwrap();

        let loaded = load(&vault, pdf);
        assert_eq!(loaded.stroke_count(), 1);
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let mut vault = MemoryVault::new();
        let pdf = Path::new("doc.pdf");

        save(&mut vault, pdf, &sample_set()).unwrap();

        let mut smaller = PageAnnotationSet::new();
        let mut stroke = Stroke::new(Tool::Eraser, HexColor::black(), 30.0);
        stroke.push(InputPoint::plain(0.0, 0.0, 0.0));
        smaller.replace_page(2, vec![stroke]);
        save(&mut vault, pdf, &smaller).unwrap();

        let loaded = load(&vault, pdf);
        assert_eq!(loaded, smaller);
        assert!(loaded.strokes_for(1).is_empty());
    }

    #[test]
    fn test_disk_vault_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let mut vault = crate::vault::DiskVault::new(temp.path());
        let pdf = Path::new("paper.pdf");
        let set = sample_set();

        save(&mut vault, pdf, &set).unwrap();
        assert_eq!(load(&vault, pdf), set);

        save(&mut vault, pdf, &PageAnnotationSet::new()).unwrap();
        assert!(!sidecar_exists(&vault, pdf));
    }
}

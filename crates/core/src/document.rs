//! Per-document annotation state
//!
//! The page annotation set is the one piece of state shared between the
//! per-page canvas engines and the persistence adapter. All mutation
//! happens synchronously on the host event loop, so no locking is used;
//! engines flush into their page slot before teardown and the adapter
//! replaces the whole set on load.

use crate::stroke::Stroke;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sidecar format version.
///
/// Version `"2"` stores coordinates normalized to 0..1 fractions of the
/// upright page size, so annotations align across sessions that render
/// at different default scales. Version `"1"` files (absolute
/// capture-scale pixels) are still read as-is.
pub const FORMAT_VERSION: &str = "2";

/// Ordered strokes per page.
///
/// Page numbers are 1-based and unique. A page absent from the map has
/// zero strokes; an empty stroke list is never stored (replacing a page
/// with an empty list removes the entry). Later strokes draw on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageAnnotationSet(BTreeMap<u32, Vec<Stroke>>);

impl PageAnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strokes for a page, in z-order. Empty for unannotated pages.
    pub fn strokes_for(&self, page_number: u32) -> &[Stroke] {
        self.0.get(&page_number).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace a page's stroke list wholesale.
    ///
    /// An empty list removes the page entry, keeping the "absent page
    /// has zero strokes" invariant intact on disk.
    pub fn replace_page(&mut self, page_number: u32, strokes: Vec<Stroke>) {
        debug_assert!(page_number >= 1, "page numbers are 1-based");
        if strokes.is_empty() {
            self.0.remove(&page_number);
        } else {
            self.0.insert(page_number, strokes);
        }
    }

    /// Remove and return a page's strokes.
    pub fn take_page(&mut self, page_number: u32) -> Vec<Stroke> {
        self.0.remove(&page_number).unwrap_or_default()
    }

    /// Page numbers that carry at least one stroke, ascending.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.0.len()
    }

    pub fn stroke_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop entries that must never exist in a well-formed set:
    /// zero-point strokes and strokes tagged with a non-drawing tool.
    /// Returns the number of strokes dropped.
    pub fn sanitize(&mut self) -> usize {
        let before = self.stroke_count();
        for strokes in self.0.values_mut() {
            strokes.retain(|s| !s.is_empty() && s.tool.is_drawing());
        }
        self.0.retain(|_, strokes| !strokes.is_empty());
        before - self.stroke_count()
    }
}

/// The persisted unit: format version, source document path, and the
/// full per-page stroke mapping. Overwritten wholesale on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDocument {
    pub version: String,
    pub pdf_path: String,
    pub page_annotations: PageAnnotationSet,
}

impl AnnotationDocument {
    pub fn new(pdf_path: impl Into<String>, page_annotations: PageAnnotationSet) -> Self {
        Self { version: FORMAT_VERSION.to_string(), pdf_path: pdf_path.into(), page_annotations }
    }
}

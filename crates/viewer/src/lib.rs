//! PDF Ink Viewer Library
//!
//! The page render coordinator: lazy per-page mounting driven by
//! visibility, zoom/rotation recreate cycles, and save/load
//! orchestration over the annotation set.

pub mod coordinator;
pub mod host;
pub mod page;

pub use coordinator::{
    CoordinatorConfig, CoordinatorError, CoordinatorResult, PageRenderCoordinator,
};
pub use host::{HostView, VisibilityNotifier, PRELOAD_MARGIN};
pub use page::PageState;

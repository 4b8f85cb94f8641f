//! PDF Ink Core Library
//!
//! Stroke data model, per-document annotation state, and sidecar
//! persistence for the annotation layer.

pub mod document;
pub mod persistence;
pub mod stroke;
pub mod vault;

pub use document::{AnnotationDocument, PageAnnotationSet, FORMAT_VERSION};
pub use persistence::{
    load, save, sidecar_exists, sidecar_path, PersistenceError, PersistenceResult, SIDECAR_SUFFIX,
};
pub use stroke::{HexColor, InputPoint, Stroke, Tool, ToolConfig};
pub use vault::{DiskVault, MemoryVault, Vault, VaultError, VaultResult};

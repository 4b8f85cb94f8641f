//! Host file-system access
//!
//! The annotation layer never touches the file system directly; it goes
//! through the `Vault` trait so the host application decides where and
//! how files live. `DiskVault` is the std::fs-backed implementation;
//! `MemoryVault` backs tests and hosts without a real disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("text file is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Host file-system capability.
///
/// Paths are vault-relative. Deleting a missing file is not an error;
/// reading one is.
pub trait Vault {
    fn read_binary(&self, path: &Path) -> VaultResult<Vec<u8>>;
    fn read_text(&self, path: &Path) -> VaultResult<String>;
    /// Create or overwrite. No partially written state may be observable.
    fn write_text(&mut self, path: &Path, contents: &str) -> VaultResult<()>;
    fn delete(&mut self, path: &Path) -> VaultResult<()>;
    fn exists(&self, path: &Path) -> bool;
    /// All files under the vault with the given extension (no dot).
    fn list_files(&self, extension: &str) -> VaultResult<Vec<PathBuf>>;
}

/// Vault rooted at a directory on disk.
///
/// Writes are atomic from the caller's perspective: contents go to a
/// temporary sibling first, then rename over the target.
#[derive(Debug, Clone)]
pub struct DiskVault {
    root: PathBuf,
}

impl DiskVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }

    fn collect_files(
        dir: &Path,
        extension: &str,
        out: &mut Vec<PathBuf>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::collect_files(&path, extension, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl Vault for DiskVault {
    fn read_binary(&self, path: &Path) -> VaultResult<Vec<u8>> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(VaultError::NotFound(full));
        }
        Ok(fs::read(full)?)
    }

    fn read_text(&self, path: &Path) -> VaultResult<String> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes).map_err(|_| VaultError::InvalidUtf8(self.resolve(path)))
    }

    fn write_text(&mut self, path: &Path, contents: &str) -> VaultResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = full.with_extension("tmp");
        fs::write(&temp, contents)?;
        fs::rename(&temp, &full)?;
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> VaultResult<()> {
        let full = self.resolve(path);
        if full.exists() {
            fs::remove_file(full)?;
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn list_files(&self, extension: &str) -> VaultResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.root.exists() {
            Self::collect_files(&self.root, extension, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory vault.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Vault for MemoryVault {
    fn read_binary(&self, path: &Path) -> VaultResult<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| VaultError::NotFound(path.to_path_buf()))
    }

    fn read_text(&self, path: &Path) -> VaultResult<String> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes).map_err(|_| VaultError::InvalidUtf8(path.to_path_buf()))
    }

    fn write_text(&mut self, path: &Path, contents: &str) -> VaultResult<()> {
        self.files.insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> VaultResult<()> {
        self.files.remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn list_files(&self, extension: &str) -> VaultResult<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
            .cloned()
            .collect())
    }
}

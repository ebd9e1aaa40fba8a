//! File output helpers shared by the FITS container and preview writers.
//!
//! Outputs are written next to their destination under a temporary name and
//! renamed into place only once complete. The external job runner treats a
//! missing output as "still needs work", so a partially written file must
//! never appear under the final name.

pub mod fits;

use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::debug;

use crate::error::{EyeballError, Result};

/// Create the parent directory of `path` if needed.
///
/// Sibling processes may race to create the same directory; an
/// "already exists" outcome is not an error.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    debug!("making directory: {}", dir.display());
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(EyeballError::output_write(dir, e)),
    }
}

fn temp_in_target_dir(target: &Path) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| EyeballError::output_write(target, e))
}

fn verify_written(target: &Path) -> Result<()> {
    if target.exists() {
        Ok(())
    } else {
        Err(EyeballError::output_write(target, "file missing after rename"))
    }
}

/// A temporary file that becomes `target` on [`commit`](AtomicFile::commit).
///
/// Dropping without committing removes the temporary file.
#[derive(Debug)]
pub struct AtomicFile {
    file: NamedTempFile,
    target: PathBuf,
}

impl AtomicFile {
    pub fn new(target: &Path) -> Result<Self> {
        Ok(Self {
            file: temp_in_target_dir(target)?,
            target: target.to_path_buf(),
        })
    }

    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Close the handle but keep the temporary path reserved, for writers
    /// that open the file by name themselves.
    pub fn into_atomic_path(self) -> AtomicPath {
        AtomicPath {
            temp: self.file.into_temp_path(),
            target: self.target,
        }
    }

    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.file
            .persist(&target)
            .map_err(|e| EyeballError::output_write(&target, e.error))?;
        verify_written(&target)
    }
}

/// A reserved temporary path that becomes `target` on [`commit`](AtomicPath::commit).
#[derive(Debug)]
pub struct AtomicPath {
    temp: TempPath,
    target: PathBuf,
}

impl AtomicPath {
    pub fn new(target: &Path) -> Result<Self> {
        Ok(AtomicFile::new(target)?.into_atomic_path())
    }

    /// Where the content is written before commit
    pub fn path(&self) -> &Path {
        &self.temp
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| EyeballError::output_write(&target, e.error))?;
        verify_written(&target)
    }
}

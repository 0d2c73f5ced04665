//! Temp-file staging with guaranteed cleanup.
//!
//! Every render stages its input (and the engine's raw output) under
//! uniquely named paths in the temp directory. The [`TempArtifact`] guard
//! removes the file when dropped, so cleanup holds on every exit path,
//! including early returns and panics unwinding through the orchestrator.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::TRACING_TARGET_RENDER;
use crate::error::Result;

/// A temp file removed on drop.
///
/// Removal is best-effort: a file that is already gone (e.g. after it was
/// renamed into its final location) is not an error.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// Adopts an existing path as a drop-guarded temp artifact.
    pub fn adopt(path: PathBuf) -> Self {
        Self { path }
    }

    /// Stages diagram source into a new uniquely named temp input.
    ///
    /// Creates the temp directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory or file cannot be written.
    pub async fn stage_input(temp_dir: &Path, token: Uuid, source: &str) -> Result<Self> {
        fs::create_dir_all(temp_dir).await?;
        let path = temp_dir.join(format!("{token}.mmd"));
        fs::write(&path, source).await?;
        tracing::debug!(
            target: TRACING_TARGET_RENDER,
            path = %path.display(),
            bytes = source.len(),
            "staged diagram source"
        );
        Ok(Self { path })
    }

    /// Reserves a uniquely named temp output path for the engine to write.
    ///
    /// The file itself is created by the engine; the guard only owns the
    /// name.
    pub fn reserve_output(temp_dir: &Path, token: Uuid, extension: &str) -> Self {
        Self {
            path: temp_dir.join(format!("{token}.{extension}")),
        }
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET_RENDER,
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove temp artifact"
                );
            }
        }
    }
}

/// Moves a file into place atomically from the caller's point of view.
///
/// The rename is attempted first; when source and destination live on
/// different filesystems the rename fails and the file is copied and the
/// source removed instead. Callers stage the content next to the final
/// location's filesystem whenever possible so the rename path is the
/// common one.
pub async fn install_atomic(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, destination).await?;
            fs::remove_file(source).await?;
            Ok(())
        }
    }
}

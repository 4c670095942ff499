//! The per-request working area: a private temp directory.
//!
//! ## Why a `TempDir` and an explicit `release`?
//!
//! The renderer needs real file paths, one to read the HTML from and one to
//! write the PDF to. Each request gets its own uniquely named directory, so
//! concurrent conversions never see each other's files.
//!
//! [`WorkingArea`] owns a [`tempfile::TempDir`]. Any exit path, including an
//! early `?` or a panic, drops it and removes the directory. The normal path
//! calls [`WorkingArea::release`] instead. It removes the directory off the
//! async runtime and logs a failure instead of dropping it silently.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name of the staged HTML inside a working area.
pub const INPUT_FILE: &str = "input.html";

/// File name the renderer writes its PDF to inside a working area.
pub const OUTPUT_FILE: &str = "output.pdf";

const DIR_PREFIX: &str = "deck2pdf-";

/// An exclusively-owned, uniquely named directory holding one conversion.
#[derive(Debug)]
pub struct WorkingArea {
    dir: TempDir,
}

impl WorkingArea {
    /// Create a fresh working area under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(DIR_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|source| ConvertError::Staging {
            path: root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source,
        })?;
        debug!("Created working area {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Root directory of this working area.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of the staged HTML file.
    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(INPUT_FILE)
    }

    /// Absolute path the renderer writes the PDF to.
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    /// Write the HTML verbatim to [`INPUT_FILE`].
    pub async fn stage_html(&self, html: &str) -> Result<PathBuf, ConvertError> {
        let path = self.input_path();
        tokio::fs::write(&path, html.as_bytes())
            .await
            .map_err(|source| ConvertError::Staging {
                path: path.clone(),
                source,
            })?;
        debug!("Staged {} bytes of HTML at {}", html.len(), path.display());
        Ok(path)
    }

    /// Read the renderer's PDF back from [`OUTPUT_FILE`].
    pub async fn read_output(&self) -> Result<Vec<u8>, ConvertError> {
        let path = self.output_path();
        tokio::fs::read(&path)
            .await
            .map_err(|source| ConvertError::ResultRead { path, source })
    }

    /// Recursively remove the directory. Failures are logged, never returned.
    pub async fn release(self) {
        let path = self.dir.path().to_path_buf();
        match tokio::task::spawn_blocking(move || self.dir.close()).await {
            Ok(Ok(())) => debug!("Removed working area {}", path.display()),
            Ok(Err(e)) => warn!("Failed to remove working area {}: {}", path.display(), e),
            Err(e) => warn!("Cleanup task for {} panicked: {}", path.display(), e),
        }
    }
}

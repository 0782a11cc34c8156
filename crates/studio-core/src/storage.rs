//! On-disk layout for uploads, portfolio images and exported projects.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StudioError};

/// Image extensions accepted for uploads.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Directory layout rooted at the studio data directory.
///
/// ```text
/// <data>/uploads/                supply photos
/// <data>/portfolio/              artwork images
/// <data>/portfolio/thumbnails/
/// <data>/portfolio/progress/
/// <data>/projects/               exported project files
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn portfolio_dir(&self) -> PathBuf {
        self.root.join("portfolio")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.portfolio_dir().join("thumbnails")
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.portfolio_dir().join("progress")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// Create every directory of the layout.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.uploads_dir(),
            self.thumbnails_dir(),
            self.progress_dir(),
            self.projects_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Validate and write uploaded bytes into `dir`, returning the stored path.
    pub fn save_upload(&self, dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        if !allowed_file(filename) {
            return Err(StudioError::validation("Invalid file type"));
        }
        let name = secure_filename(filename);
        if name.is_empty() {
            return Err(StudioError::validation("No file selected"));
        }
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        let path = dir.join(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write upload {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(path)
    }
}

/// Whether `filename` carries an accepted image extension.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Reduce an arbitrary client-supplied filename to a safe basename.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; whitespace becomes `_`;
/// any directory components and leading dots are dropped.
pub fn secure_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Local timestamp used to prefix copied files.
pub(crate) fn file_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `<timestamp>_<random>_<basename>`. Unique even for two copies of the
/// same basename within one second.
pub(crate) fn stamped_name(basename: &str) -> String {
    format!("{}_{}_{basename}", file_timestamp(), Uuid::new_v4().simple())
}

/// Reject a source file whose name lacks an accepted image extension.
pub(crate) fn check_image_source(source: &Path) -> Result<()> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if allowed_file(&name) {
        Ok(())
    } else {
        Err(StudioError::validation(format!(
            "Invalid file type: {}",
            source.display()
        )))
    }
}

/// Copy `source` into `dir` under `name`, returning the destination path.
pub(crate) fn copy_into(source: &Path, dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let dest = dir.join(name);
    std::fs::copy(source, &dest).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            dest.display()
        )
    })?;
    Ok(dest)
}

/// Basename of `path` passed through [`secure_filename`].
pub(crate) fn secure_basename(path: &Path) -> String {
    path.file_name()
        .map(|n| secure_filename(&n.to_string_lossy()))
        .unwrap_or_default()
}

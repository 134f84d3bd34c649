use std::path::{Path, PathBuf};

use crate::capture::domain::capture_exporter::{CaptureExporter, ExportOutcome};
use crate::capture::domain::captured_image::{CaptureError, CapturedImage};

/// Saves captures as timestamped PNGs in a directory.
///
/// Two captures in the same second get `_1`, `_2`, ... suffixes instead of
/// overwriting each other.
pub struct DownloadExporter {
    dir: PathBuf,
}

impl DownloadExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, else the current directory.
    pub fn default_dir() -> PathBuf {
        dirs::download_dir()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, image: &CapturedImage) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CaptureError::Write {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = unique_path(&self.dir, &image.suggested_filename());
        std::fs::write(&path, image.png()).map_err(|e| CaptureError::Write {
            path: path.clone(),
            source: e,
        })?;
        log::info!("Saved capture to {}", path.display());
        Ok(path)
    }
}

impl CaptureExporter for DownloadExporter {
    fn export(&self, image: &CapturedImage) -> Result<ExportOutcome, Box<dyn std::error::Error>> {
        Ok(ExportOutcome::Downloaded(self.save(image)?))
    }
}

fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (file_name, String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

use std::path::{Path, PathBuf};

use crate::capture::domain::capture_exporter::{CaptureExporter, ExportOutcome};
use crate::capture::domain::captured_image::{CaptureError, CapturedImage};
use crate::shared::constants::{APP_NAME, SHARE_FILE_NAME};

use super::download_exporter::DownloadExporter;

/// Hands a staged file to whatever the OS uses to share/open it.
pub type Opener = Box<dyn Fn(&Path) -> std::io::Result<()> + Send + Sync>;

/// Shares a capture by staging it as `break-a-boo.png` and opening it with
/// the default handler. Any failure falls back to a regular download.
pub struct ShareExporter {
    staging_dir: PathBuf,
    opener: Opener,
    fallback: DownloadExporter,
}

impl ShareExporter {
    pub fn new(fallback: DownloadExporter) -> Self {
        Self::with_opener(
            std::env::temp_dir().join(APP_NAME),
            Box::new(|path| open::that(path)),
            fallback,
        )
    }

    pub fn with_opener(staging_dir: PathBuf, opener: Opener, fallback: DownloadExporter) -> Self {
        Self {
            staging_dir,
            opener,
            fallback,
        }
    }

    fn share(&self, image: &CapturedImage) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(&self.staging_dir).map_err(|e| CaptureError::Write {
            path: self.staging_dir.clone(),
            source: e,
        })?;
        let path = self.staging_dir.join(SHARE_FILE_NAME);
        std::fs::write(&path, image.png()).map_err(|e| CaptureError::Write {
            path: path.clone(),
            source: e,
        })?;
        (self.opener)(&path).map_err(CaptureError::Share)?;
        Ok(path)
    }
}

impl CaptureExporter for ShareExporter {
    fn export(&self, image: &CapturedImage) -> Result<ExportOutcome, Box<dyn std::error::Error>> {
        match self.share(image) {
            Ok(path) => {
                log::info!("Shared capture via {}", path.display());
                Ok(ExportOutcome::Shared(path))
            }
            Err(e) => {
                log::warn!("Sharing failed ({e}); downloading instead");
                Ok(ExportOutcome::Downloaded(self.fallback.save(image)?))
            }
        }
    }
}

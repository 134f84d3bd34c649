use std::path::PathBuf;

use super::captured_image::CapturedImage;

/// Where a capture ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded(PathBuf),
    Shared(PathBuf),
}

impl ExportOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            ExportOutcome::Downloaded(p) | ExportOutcome::Shared(p) => p,
        }
    }
}

/// Domain interface for handing a capture to the user.
pub trait CaptureExporter: Send {
    fn export(&self, image: &CapturedImage) -> Result<ExportOutcome, Box<dyn std::error::Error>>;
}

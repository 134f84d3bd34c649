use std::path::PathBuf;

/// Frame rate assumed when the source does not report one (cameras often
/// don't until the first packets arrive).
pub const FALLBACK_FPS: f64 = 30.0;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 for live sources whose length is unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Seconds between consecutive frames, used to advance the overlay fade.
    pub fn frame_interval(&self) -> f64 {
        if self.fps > 0.0 {
            1.0 / self.fps
        } else {
            1.0 / FALLBACK_FPS
        }
    }

    pub fn is_live(&self) -> bool {
        self.total_frames == 0
    }
}

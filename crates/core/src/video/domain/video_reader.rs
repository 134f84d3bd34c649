use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

use super::video_source::VideoSource;

/// Reads frames from a camera, video file or still image.
///
/// Implementations handle I/O details (device, codec, container format)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types.
pub trait VideoReader: Send {
    /// Acquires the source and returns its metadata. Camera failures are
    /// reported as [`CameraError`](super::video_source::CameraError).
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the camera or file. Safe to call more than once.
    fn close(&mut self);
}

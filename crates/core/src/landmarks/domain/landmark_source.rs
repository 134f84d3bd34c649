use crate::shared::frame::Frame;

use super::face_landmarks::FaceLandmarks;

/// What the detector boundary reported for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FaceObservation {
    Face(FaceLandmarks),
    /// Detector ran and found nothing. Expected steady state, not an error.
    NoFace,
    /// No detector is available; placement degrades to the untracked mode.
    Untracked,
}

/// Domain interface for the external face-landmark detector.
///
/// Accepts one frame at a time and yields zero or one face. Implementations
/// may be stateful (draining a channel, replaying a recording), hence
/// `&mut self`.
pub trait LandmarkSource: Send {
    fn observe(&mut self, frame: &Frame) -> Result<FaceObservation, Box<dyn std::error::Error>>;

    /// Releases the detector. Must be safe to call more than once.
    fn close(&mut self) {}

    fn name(&self) -> &str;
}

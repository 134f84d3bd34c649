use crate::landmarks::domain::landmark_source::{FaceObservation, LandmarkSource};
use crate::shared::frame::Frame;

/// Stand-in used when no detector could be started. Every frame is
/// untracked, so the planner draws the mask centered and unrotated.
pub struct FallbackLandmarkSource;

impl LandmarkSource for FallbackLandmarkSource {
    fn observe(&mut self, _frame: &Frame) -> Result<FaceObservation, Box<dyn std::error::Error>> {
        Ok(FaceObservation::Untracked)
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

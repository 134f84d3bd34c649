use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::landmarks::domain::face_landmarks::FaceLandmarks;
use crate::landmarks::domain::landmark_source::{FaceObservation, LandmarkSource};
use crate::shared::frame::Frame;

use super::landmark_track::{read_track, LandmarkResult, TrackError};

/// Replays detector results recorded ahead of time, keyed by frame index.
///
/// Frames missing from the recording are reported as "no face".
pub struct RecordedLandmarkSource {
    results: HashMap<usize, Option<FaceLandmarks>>,
}

impl RecordedLandmarkSource {
    pub fn new(results: Vec<LandmarkResult>) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|r| (r.frame_index, r.face))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let file = File::open(path).map_err(|e| TrackError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let results = read_track(BufReader::new(file))?;
        log::info!(
            "Loaded {} landmark records from {}",
            results.len(),
            path.display()
        );
        Ok(Self::new(results))
    }
}

impl LandmarkSource for RecordedLandmarkSource {
    fn observe(&mut self, frame: &Frame) -> Result<FaceObservation, Box<dyn std::error::Error>> {
        Ok(match self.results.get(&frame.index()) {
            Some(Some(face)) => FaceObservation::Face(face.clone()),
            _ => FaceObservation::NoFace,
        })
    }

    fn close(&mut self) {
        self.results.clear();
    }

    fn name(&self) -> &str {
        "recorded"
    }
}

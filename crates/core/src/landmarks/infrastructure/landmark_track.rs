//! JSON Lines wire format for detector results.
//!
//! One record per line, either dense or sparse:
//!
//! ```text
//! {"frame": 0, "landmarks": [[0.51, 0.42, -0.03], null, [0.49, 0.40], ...]}
//! {"frame": 1, "points": {"33": [0.3, 0.4], "263": [0.7, 0.4], ...}}
//! {"frame": 2}
//! ```
//!
//! A record without landmarks (or with an empty list) means "no face".

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::landmarks::domain::face_landmarks::{FaceLandmarks, Landmark};

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("failed to open landmark track {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read landmark track: {0}")]
    Read(#[source] std::io::Error),
    #[error("line {line}: invalid landmark record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// The detector's answer for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkResult {
    pub frame_index: usize,
    pub face: Option<FaceLandmarks>,
}

#[derive(Deserialize)]
struct TrackRecord {
    frame: usize,
    #[serde(default)]
    landmarks: Option<Vec<Option<Vec<f64>>>>,
    #[serde(default)]
    points: Option<BTreeMap<usize, Vec<f64>>>,
}

/// Parses one line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_record(line: &str) -> Result<Option<LandmarkResult>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let record: TrackRecord = serde_json::from_str(trimmed)?;
    let face = match (record.landmarks, record.points) {
        (Some(dense), _) if !dense.is_empty() => Some(FaceLandmarks::from_optional(
            dense
                .iter()
                .map(|p| p.as_deref().and_then(to_landmark))
                .collect(),
        )),
        (_, Some(sparse)) => Some(FaceLandmarks::from_sparse(
            sparse
                .iter()
                .filter_map(|(&i, p)| to_landmark(p).map(|lm| (i, lm))),
        )),
        _ => None,
    };

    Ok(Some(LandmarkResult {
        frame_index: record.frame,
        face: face.filter(|f| !f.is_empty()),
    }))
}

/// Reads a whole recording. Any malformed line fails the read.
pub fn read_track(reader: impl BufRead) -> Result<Vec<LandmarkResult>, TrackError> {
    let mut results = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(TrackError::Read)?;
        let parsed = parse_record(&line).map_err(|e| TrackError::Parse {
            line: i + 1,
            source: e,
        })?;
        results.extend(parsed);
    }
    Ok(results)
}

/// `[x, y]` or `[x, y, z]`; anything shorter is malformed and dropped.
fn to_landmark(coords: &[f64]) -> Option<Landmark> {
    match *coords {
        [x, y] => Some(Landmark::new(x, y)),
        [x, y, z, ..] => Some(Landmark::with_depth(x, y, z)),
        _ => None,
    }
}

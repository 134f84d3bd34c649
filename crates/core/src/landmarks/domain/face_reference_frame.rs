//! Face pose on the mirrored canvas, derived from seven mesh landmarks.
//!
//! The anchor blends nose, eye midpoint and chin. Horizontally the nose
//! dominates (it moves least when the head turns); vertically nose and chin
//! share the weight, which pulls the anchor low, so `vertical_offset` lifts
//! the mask back up by a fraction of the face height.

use super::face_landmarks::{indices, FaceLandmarks, Landmark};

/// Upward bias applied to the anchor, as a fraction of face height.
pub const VERTICAL_OFFSET_RATIO: f64 = 0.22;

/// Anchor weights: [nose, eye_mid, chin].
const CENTER_X_WEIGHTS: [f64; 3] = [0.55, 0.25, 0.20];
const CENTER_Y_WEIGHTS: [f64; 3] = [0.40, 0.20, 0.40];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Pixel-space pose of one face. Only exists when every required landmark
/// was present; absence is the "no face" signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceReferenceFrame {
    pub center: Point,
    /// In-plane head tilt in radians; 0 when the eyes are level.
    pub rotation: f64,
    pub face_width: f64,
    pub face_height: f64,
    pub eye_distance: f64,
    pub vertical_offset: f64,
}

impl FaceReferenceFrame {
    pub fn resolve(
        landmarks: &FaceLandmarks,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Option<Self> {
        if canvas_width == 0 || canvas_height == 0 || landmarks.is_empty() {
            return None;
        }
        if !landmarks.has_all(&indices::REQUIRED) {
            return None;
        }

        let (w, h) = (canvas_width as f64, canvas_height as f64);
        let point = |index: usize| landmarks.get(index).map(|lm| to_canvas(lm, w, h));

        let left_eye = point(indices::LEFT_EYE_OUTER)?;
        let right_eye = point(indices::RIGHT_EYE_OUTER)?;
        let nose = point(indices::NOSE_TIP)?;
        let chin = point(indices::CHIN)?;
        let forehead = point(indices::FOREHEAD)?;
        let left_cheek = point(indices::LEFT_CHEEK)?;
        let right_cheek = point(indices::RIGHT_CHEEK)?;

        let eye_mid = left_eye.midpoint(&right_eye);

        // Mirroring puts the subject's right eye (263) on the canvas left;
        // measuring the eye line left-to-right keeps level eyes at 0.
        let rotation = (left_eye.y - right_eye.y).atan2(left_eye.x - right_eye.x);

        let face_width = left_cheek.distance(&right_cheek);
        let face_height = forehead.distance(&chin);
        let eye_distance = left_eye.distance(&right_eye);

        let center = Point::new(
            weighted(CENTER_X_WEIGHTS, [nose.x, eye_mid.x, chin.x]),
            weighted(CENTER_Y_WEIGHTS, [nose.y, eye_mid.y, chin.y]),
        );

        Some(Self {
            center,
            rotation,
            face_width,
            face_height,
            eye_distance,
            vertical_offset: face_height * VERTICAL_OFFSET_RATIO,
        })
    }
}

fn to_canvas(landmark: &Landmark, width: f64, height: f64) -> Point {
    let mirrored = landmark.mirrored();
    Point::new(mirrored.x * width, mirrored.y * height)
}

fn weighted(weights: [f64; 3], values: [f64; 3]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

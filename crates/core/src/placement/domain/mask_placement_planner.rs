//! Turns a face observation into the transform the mask is drawn with.
//!
//! Three modes:
//! - full-frame filters cover the canvas and ignore landmarks,
//! - face-anchored masks follow the resolved face, smoothed across frames,
//! - untracked (no detector) masks sit centered and unrotated.

use crate::landmarks::domain::face_reference_frame::FaceReferenceFrame;
use crate::landmarks::domain::landmark_source::FaceObservation;

use super::canvas_geometry::CanvasGeometry;
use super::mask_transform::MaskTransform;
use super::transform_smoother::TransformSmoother;

pub const FACE_WIDTH_SCALE: f64 = 0.95;
pub const EYE_DISTANCE_SCALE: f64 = 1.85;
pub const FACE_HEIGHT_SCALE: f64 = 1.08;
/// Widest a face mask may get, as a fraction of canvas width.
pub const MAX_WIDTH_RATIO: f64 = 0.78;
/// Side of the untracked square mask, as a fraction of canvas width.
pub const FALLBACK_SIZE_RATIO: f64 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    Hidden,
    Visible(MaskTransform),
}

impl Placement {
    pub fn transform(&self) -> Option<&MaskTransform> {
        match self {
            Placement::Hidden => None,
            Placement::Visible(t) => Some(t),
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Placement::Visible(_))
    }
}

/// Everything the planner needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct PlacementRequest<'a> {
    pub observation: &'a FaceObservation,
    /// Mask image height / width.
    pub mask_aspect: f64,
    pub full_frame: bool,
    pub size_multiplier: f64,
    pub canvas: CanvasGeometry,
}

/// Stateful planner; owns the smoothing memory for the current filter.
pub struct MaskPlacementPlanner {
    smoother: TransformSmoother,
    last_multiplier: Option<f64>,
}

impl MaskPlacementPlanner {
    pub fn new(smoother: TransformSmoother) -> Self {
        Self {
            smoother,
            last_multiplier: None,
        }
    }

    /// Forget the previous placement. Called on filter or image change.
    pub fn reset(&mut self) {
        self.smoother.reset();
    }

    pub fn previous(&self) -> Option<&MaskTransform> {
        self.smoother.previous()
    }

    pub fn plan(&mut self, request: &PlacementRequest) -> Placement {
        let aspect = request.mask_aspect;
        if request.canvas.is_degenerate() || !aspect.is_finite() || aspect <= 0.0 {
            self.reset();
            return Placement::Hidden;
        }

        if self
            .last_multiplier
            .is_some_and(|m| m != request.size_multiplier)
        {
            log::debug!(
                "Mask size changed to {:.2}; resetting smoothing",
                request.size_multiplier
            );
            self.reset();
        }
        self.last_multiplier = Some(request.size_multiplier);

        if request.full_frame {
            self.reset();
            return Placement::Visible(cover_transform(aspect, &request.canvas));
        }

        match request.observation {
            FaceObservation::Untracked => {
                self.reset();
                Placement::Visible(fallback_transform(
                    request.size_multiplier,
                    &request.canvas,
                ))
            }
            FaceObservation::NoFace => {
                self.reset();
                Placement::Hidden
            }
            FaceObservation::Face(landmarks) => {
                let Some(face) = FaceReferenceFrame::resolve(
                    landmarks,
                    request.canvas.width,
                    request.canvas.height,
                ) else {
                    self.reset();
                    return Placement::Hidden;
                };
                let target =
                    target_transform(&face, aspect, request.size_multiplier, &request.canvas);
                if !target.is_finite() {
                    self.reset();
                    return Placement::Hidden;
                }
                Placement::Visible(self.smoother.smooth(target))
            }
        }
    }
}

impl Default for MaskPlacementPlanner {
    fn default() -> Self {
        Self::new(TransformSmoother::default())
    }
}

/// Raw (unsmoothed) face-anchored transform.
pub fn target_transform(
    face: &FaceReferenceFrame,
    mask_aspect: f64,
    size_multiplier: f64,
    canvas: &CanvasGeometry,
) -> MaskTransform {
    let (cw, ch) = (canvas.width as f64, canvas.height as f64);
    let scale = size_multiplier * canvas.frame_scale();

    let base_width = (face.face_width * FACE_WIDTH_SCALE).max(face.eye_distance * EYE_DISTANCE_SCALE);
    let base_height = (face.face_height * FACE_HEIGHT_SCALE).max(base_width * mask_aspect);

    let mut width = base_width * scale;
    let mut height = base_height * scale;
    let max_width = cw * MAX_WIDTH_RATIO;
    if width > max_width {
        let shrink = max_width / width;
        width *= shrink;
        height *= shrink;
    }

    MaskTransform {
        x: clamp_low_wins(face.center.x, width / 2.0, cw - width / 2.0),
        y: clamp_low_wins(
            face.center.y - face.vertical_offset,
            height / 2.0,
            ch - height / 2.0,
        ),
        width,
        height,
        rotation: face.rotation,
    }
}

/// Canvas-covering transform for full-frame filters, preserving image aspect.
pub fn cover_transform(mask_aspect: f64, canvas: &CanvasGeometry) -> MaskTransform {
    let (cw, ch) = (canvas.width as f64, canvas.height as f64);
    let image_aspect = 1.0 / mask_aspect;
    let (width, height) = if image_aspect > canvas.aspect() {
        (ch * image_aspect, ch)
    } else {
        (cw, cw / image_aspect)
    };
    MaskTransform::new(cw / 2.0, ch / 2.0, width, height, 0.0)
}

/// Centered square used while no detector is available.
pub fn fallback_transform(size_multiplier: f64, canvas: &CanvasGeometry) -> MaskTransform {
    let (cw, ch) = (canvas.width as f64, canvas.height as f64);
    let side = cw * FALLBACK_SIZE_RATIO * size_multiplier * canvas.frame_scale();
    MaskTransform::new(cw / 2.0, ch / 2.0, side, side, 0.0)
}

// The lower bound wins when the mask is larger than the canvas.
fn clamp_low_wins(value: f64, low: f64, high: f64) -> f64 {
    value.min(high).max(low)
}

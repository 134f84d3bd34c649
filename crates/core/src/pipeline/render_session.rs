//! Per-session render state, stepped once per video frame.
//!
//! ```text
//! NoFace --face--> Tracking --no face--> NoFace
//!   any --filter/size change--> reset --> NoFace
//! ```

use chrono::{DateTime, Local};

use crate::capture::domain::captured_image::{CaptureError, CapturedImage};
use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::compositing::domain::overlay_fade::OverlayFade;
use crate::filters::domain::filter::Filter;
use crate::filters::domain::mask_image::MaskImage;
use crate::filters::domain::mask_loader::MaskLoader;
use crate::landmarks::domain::landmark_source::{FaceObservation, LandmarkSource};
use crate::placement::domain::canvas_geometry::CanvasGeometry;
use crate::placement::domain::mask_placement_planner::{
    MaskPlacementPlanner, Placement, PlacementRequest,
};
use crate::placement::domain::mask_size;
use crate::placement::domain::transform_smoother::{TransformSmoother, DEFAULT_SMOOTHING};
use crate::shared::constants::{DEFAULT_MASK_SIZE, OVERLAY_FADE_SECONDS};
use crate::shared::frame::{Frame, RGB, RGBA};

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub smoothing: f64,
    pub mask_size: f64,
    pub display_size: Option<(f64, f64)>,
    pub fade_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            mask_size: DEFAULT_MASK_SIZE,
            display_size: None,
            fade_seconds: OVERLAY_FADE_SECONDS,
        }
    }
}

/// What one render step produced.
pub struct RenderedFrame {
    pub frame: Frame,
    pub placement: Placement,
    pub opacity: f64,
}

pub struct RenderSession {
    planner: MaskPlacementPlanner,
    compositor: Box<dyn FrameCompositor>,
    landmarks: Box<dyn LandmarkSource>,
    loader: Box<dyn MaskLoader>,
    base: Frame,
    overlay: Frame,
    filter: Option<Filter>,
    mask: Option<MaskImage>,
    fade: OverlayFade,
    size_multiplier: f64,
    display_size: Option<(f64, f64)>,
    last_video: Option<Frame>,
    placement: Placement,
    closed: bool,
}

impl RenderSession {
    pub fn new(
        compositor: Box<dyn FrameCompositor>,
        landmarks: Box<dyn LandmarkSource>,
        loader: Box<dyn MaskLoader>,
        config: SessionConfig,
    ) -> Self {
        log::info!("Render session using {} landmark source", landmarks.name());
        Self {
            planner: MaskPlacementPlanner::new(TransformSmoother::new(config.smoothing)),
            compositor,
            landmarks,
            loader,
            base: Frame::blank(0, 0, RGB),
            overlay: Frame::blank(0, 0, RGBA),
            filter: None,
            mask: None,
            fade: OverlayFade::new(config.fade_seconds),
            size_multiplier: mask_size::snap(config.mask_size),
            display_size: config.display_size,
            last_video: None,
            placement: Placement::Hidden,
            closed: false,
        }
    }

    /// Loads the filter's mask and makes it current.
    ///
    /// On failure the previous filter and image stay in place. On success
    /// smoothing restarts and the overlay is hidden until the next placement.
    pub fn select_filter(&mut self, filter: &Filter) -> Result<(), Box<dyn std::error::Error>> {
        let mask = match self.loader.load(filter) {
            Ok(mask) => mask,
            Err(e) => {
                log::warn!("Could not load mask for filter {}: {e}", filter.id);
                return Err(e);
            }
        };

        log::info!(
            "Selected filter {} ({}{})",
            filter.id,
            filter.name,
            if filter.full_frame { ", full frame" } else { "" }
        );
        self.filter = Some(filter.clone());
        self.mask = Some(mask);
        self.planner.reset();
        self.placement = Placement::Hidden;
        self.fade.set_visible(false);
        self.overlay.clear();
        Ok(())
    }

    /// Applies a new size multiplier, clamped and snapped to the slider step.
    /// Returns the value actually used.
    pub fn set_mask_size(&mut self, value: f64) -> f64 {
        let snapped = mask_size::snap(value);
        if snapped != self.size_multiplier {
            log::debug!("Mask size {}%", mask_size::percent(snapped));
            self.size_multiplier = snapped;
            self.planner.reset();
        }
        snapped
    }

    pub fn mask_size(&self) -> f64 {
        self.size_multiplier
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn opacity(&self) -> f64 {
        self.fade.opacity()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Renders one video frame. `dt` is the time since the previous frame in
    /// seconds and drives the overlay fade.
    ///
    /// Only a frame that cannot be drawn at all is an error; landmark and
    /// mask failures just leave the overlay off for this frame.
    pub fn step(&mut self, video: &Frame, dt: f64) -> Result<RenderedFrame, Box<dyn std::error::Error>> {
        if self.closed {
            return Err("render session is closed".into());
        }

        self.compositor.draw_video(video, &mut self.base)?;
        self.last_video = Some(video.clone());

        let observation = match self.landmarks.observe(video) {
            Ok(observation) => observation,
            Err(e) => {
                log::warn!("Landmarks unavailable for frame {}: {e}", video.index());
                FaceObservation::NoFace
            }
        };

        let placement = self.plan(&observation);
        if placement.is_visible() != self.placement.is_visible() {
            log::debug!(
                "Frame {}: {}",
                video.index(),
                if placement.is_visible() { "tracking" } else { "no face" }
            );
        }
        self.placement = placement;

        if let Err(e) = self.draw_overlay() {
            log::warn!("Skipping overlay for frame {}: {e}", video.index());
            self.placement = Placement::Hidden;
            self.overlay.clear();
        }

        self.fade.set_visible(self.placement.is_visible());
        let opacity = self.fade.advance(dt);
        let frame = self.compositor.compose(&self.base, &self.overlay, opacity)?;

        Ok(RenderedFrame {
            frame,
            placement: self.placement,
            opacity,
        })
    }

    /// Redraws the last video frame with the current placement and the
    /// overlay at full strength, and encodes it as PNG.
    pub fn capture(
        &mut self,
        captured_at: DateTime<Local>,
    ) -> Result<CapturedImage, Box<dyn std::error::Error>> {
        let video = self.last_video.take().ok_or(CaptureError::NoFrame)?;
        let result = self.compose_capture(&video);
        self.last_video = Some(video);
        Ok(CapturedImage::from_frame(&result?, captured_at)?)
    }

    /// Releases the landmark source and stops accepting frames. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.landmarks.close();
        self.last_video = None;
        self.placement = Placement::Hidden;
        self.closed = true;
        log::debug!("Render session closed");
    }

    fn plan(&mut self, observation: &FaceObservation) -> Placement {
        let (Some(filter), Some(mask)) = (&self.filter, &self.mask) else {
            return Placement::Hidden;
        };
        let mut canvas = CanvasGeometry::new(self.base.width(), self.base.height());
        canvas.display = self.display_size;

        self.planner.plan(&PlacementRequest {
            observation,
            mask_aspect: mask.aspect_ratio(),
            full_frame: filter.full_frame,
            size_multiplier: self.size_multiplier,
            canvas,
        })
    }

    fn draw_overlay(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.overlay.same_size(&self.base) {
            self.overlay = Frame::blank(self.base.width(), self.base.height(), RGBA);
        }
        match &self.mask {
            Some(mask) => {
                self.compositor
                    .draw_mask(mask, self.placement.transform(), &mut self.overlay)
            }
            None => {
                self.overlay.clear();
                Ok(())
            }
        }
    }

    fn compose_capture(&mut self, video: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        self.compositor.draw_video(video, &mut self.base)?;
        self.draw_overlay()?;
        let opacity = if self.placement.is_visible() { 1.0 } else { 0.0 };
        self.compositor.compose(&self.base, &self.overlay, opacity)
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::compositing::infrastructure::cpu_frame_compositor::CpuFrameCompositor;
    use crate::landmarks::domain::face_landmarks::{indices, FaceLandmarks, Landmark};
    use crate::landmarks::domain::face_reference_frame::FaceReferenceFrame;
    use crate::placement::domain::mask_placement_planner::target_transform;
    use crate::placement::domain::mask_transform::MaskTransform;
    use approx::assert_relative_eq;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    // --- Stubs ---

    pub(crate) struct StubLandmarks {
        pub observations: HashMap<usize, FaceObservation>,
        pub closed: Arc<AtomicBool>,
        pub fail: bool,
    }

    impl StubLandmarks {
        pub(crate) fn new(observations: impl IntoIterator<Item = (usize, FaceObservation)>) -> Self {
            Self {
                observations: observations.into_iter().collect(),
                closed: Arc::new(AtomicBool::new(false)),
                fail: false,
            }
        }
    }

    impl LandmarkSource for StubLandmarks {
        fn observe(&mut self, frame: &Frame) -> Result<FaceObservation, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("detector crashed".into());
            }
            Ok(self
                .observations
                .get(&frame.index())
                .cloned()
                .unwrap_or(FaceObservation::NoFace))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Solid opaque masks; the filter id picks the colour, `"broken"` fails.
    pub(crate) struct StubLoader;

    impl MaskLoader for StubLoader {
        fn load(&self, filter: &Filter) -> Result<MaskImage, Box<dyn std::error::Error>> {
            let color = match filter.id.as_str() {
                "broken" => return Err("asset missing".into()),
                "blue" => [0, 0, 255, 255],
                _ => [255, 0, 0, 255],
            };
            Ok(MaskImage::new(RgbaImage::from_pixel(10, 10, Rgba(color))))
        }
    }

    pub(crate) fn face(dx: f64) -> FaceLandmarks {
        let p = |x: f64, y: f64| Landmark::new(0.5 + (x - 0.5) * 0.5 + dx, 0.5 + (y - 0.5) * 0.5);
        FaceLandmarks::from_sparse([
            (indices::LEFT_EYE_OUTER, p(0.3, 0.4)),
            (indices::RIGHT_EYE_OUTER, p(0.7, 0.4)),
            (indices::NOSE_TIP, p(0.5, 0.5)),
            (indices::CHIN, p(0.5, 0.8)),
            (indices::FOREHEAD, p(0.5, 0.1)),
            (indices::LEFT_CHEEK, p(0.25, 0.5)),
            (indices::RIGHT_CHEEK, p(0.75, 0.5)),
        ])
    }

    pub(crate) fn video(index: usize) -> Frame {
        let mut f = Frame::new(vec![40; 320 * 240 * 3], 320, 240, RGB, 0);
        f.set_index(index);
        f
    }

    fn raw_target(dx: f64, multiplier: f64) -> MaskTransform {
        let frame = FaceReferenceFrame::resolve(&face(dx), 320, 240).unwrap();
        target_transform(&frame, 1.0, multiplier, &CanvasGeometry::new(320, 240))
    }

    fn session(observations: Vec<(usize, FaceObservation)>) -> RenderSession {
        RenderSession::new(
            Box::new(CpuFrameCompositor::new()),
            Box::new(StubLandmarks::new(observations)),
            Box::new(StubLoader),
            SessionConfig::default(),
        )
    }

    fn red() -> Filter {
        Filter::face_mask("red", "Red", "red.png")
    }

    fn visible(p: &Placement) -> MaskTransform {
        *p.transform().expect("expected visible placement")
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let i = (y * frame.width() as usize + x) * 3;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    #[test]
    fn test_without_filter_frame_is_mirrored_video() {
        let mut s = session(vec![(0, FaceObservation::Face(face(0.0)))]);
        let out = s.step(&video(0), 1.0).unwrap();
        assert_eq!(out.placement, Placement::Hidden);
        assert!(out.frame.data().iter().all(|&b| b == 40));
    }

    #[test]
    fn test_face_places_raw_target_then_fades_in() {
        let mut s = session(vec![(0, FaceObservation::Face(face(0.0)))]);
        s.select_filter(&red()).unwrap();

        let out = s.step(&video(0), 0.08).unwrap();
        assert_eq!(visible(&out.placement), raw_target(0.0, 1.0));
        assert_relative_eq!(out.opacity, 0.75, epsilon = 1e-9);

        let t = visible(&out.placement);
        // 40 * 0.25 + 255 * 0.75 and 40 * 0.25
        assert_eq!(pixel(&out.frame, t.x as usize, t.y as usize), [201, 10, 10]);
    }

    #[test]
    fn test_switching_filter_mid_session_resets_smoothing() {
        let mut s = session(vec![
            (0, FaceObservation::Face(face(0.0))),
            (1, FaceObservation::Face(face(-0.1))),
            (2, FaceObservation::Face(face(-0.1))),
        ]);
        s.select_filter(&red()).unwrap();
        s.step(&video(0), 0.033).unwrap();
        let smoothed = visible(&s.step(&video(1), 0.033).unwrap().placement);
        assert_ne!(smoothed, raw_target(-0.1, 1.0));

        s.select_filter(&Filter::face_mask("blue", "Blue", "blue.png"))
            .unwrap();
        assert_eq!(s.placement(), &Placement::Hidden);

        let after = visible(&s.step(&video(2), 0.033).unwrap().placement);
        assert_eq!(after, raw_target(-0.1, 1.0));
    }

    #[test]
    fn test_switching_filter_fades_out_instead_of_cutting() {
        let mut s = session(vec![
            (0, FaceObservation::Face(face(0.0))),
            (1, FaceObservation::Face(face(0.0))),
        ]);
        s.select_filter(&red()).unwrap();
        s.step(&video(0), 1.0).unwrap();
        assert_relative_eq!(s.opacity(), 1.0);

        s.select_filter(&Filter::face_mask("blue", "Blue", "blue.png"))
            .unwrap();
        // Nothing jumps until the next frame advances the ramp
        assert_relative_eq!(s.opacity(), 1.0);

        // No face on frame 2: half the fade-out has elapsed
        let out = s.step(&video(2), 0.08).unwrap();
        assert_eq!(out.placement, Placement::Hidden);
        assert_relative_eq!(out.opacity, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_failed_filter_load_keeps_previous_mask() {
        let mut s = session(vec![(0, FaceObservation::Face(face(0.0)))]);
        s.select_filter(&red()).unwrap();
        assert!(s
            .select_filter(&Filter::face_mask("broken", "Broken", "x.png"))
            .is_err());
        assert_eq!(s.filter().unwrap().id, "red");
        assert!(s.step(&video(0), 1.0).unwrap().placement.is_visible());
    }

    #[test]
    fn test_mask_size_is_snapped_and_resets_smoothing() {
        let mut s = session(vec![
            (0, FaceObservation::Face(face(0.0))),
            (1, FaceObservation::Face(face(-0.1))),
        ]);
        s.select_filter(&red()).unwrap();
        s.step(&video(0), 0.033).unwrap();

        assert_relative_eq!(s.set_mask_size(1.23), 1.25);
        assert_relative_eq!(s.set_mask_size(7.0), 2.0);
        let placed = visible(&s.step(&video(1), 0.033).unwrap().placement);
        assert_eq!(placed, raw_target(-0.1, 2.0));
    }

    #[test]
    fn test_untracked_source_draws_centered_mask() {
        let mut s = session(vec![(0, FaceObservation::Untracked)]);
        s.select_filter(&red()).unwrap();
        let t = visible(&s.step(&video(0), 1.0).unwrap().placement);
        assert_relative_eq!(t.x, 160.0);
        assert_relative_eq!(t.y, 120.0);
        assert_relative_eq!(t.width, 320.0 * 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_landmark_error_skips_overlay() {
        let mut landmarks = StubLandmarks::new(vec![(0, FaceObservation::Face(face(0.0)))]);
        landmarks.fail = true;
        let mut s = RenderSession::new(
            Box::new(CpuFrameCompositor::new()),
            Box::new(landmarks),
            Box::new(StubLoader),
            SessionConfig::default(),
        );
        s.select_filter(&red()).unwrap();
        let out = s.step(&video(0), 1.0).unwrap();
        assert_eq!(out.placement, Placement::Hidden);
        assert!(out.frame.data().iter().all(|&b| b == 40));
    }

    #[test]
    fn test_capture_uses_full_strength_overlay() {
        let mut s = session(vec![(0, FaceObservation::Face(face(0.0)))]);
        s.select_filter(&red()).unwrap();

        // dt = 0: the presented frame has not started fading in yet
        let out = s.step(&video(0), 0.0).unwrap();
        assert_relative_eq!(out.opacity, 0.0);
        let t = visible(&out.placement);
        assert_eq!(pixel(&out.frame, t.x as usize, t.y as usize), [40, 40, 40]);

        let capture = s.capture(Local::now()).unwrap();
        let png = image::load_from_memory(capture.png()).unwrap().into_rgb8();
        assert_eq!(png.get_pixel(t.x as u32, t.y as u32).0, [255, 0, 0]);
        // Capture does not advance smoothing
        assert_eq!(s.placement(), &out.placement);
    }

    #[test]
    fn test_capture_without_frame_fails() {
        let mut s = session(vec![]);
        assert!(s.capture(Local::now()).is_err());
    }

    #[test]
    fn test_close_is_idempotent_and_releases_landmarks() {
        let landmarks = StubLandmarks::new(vec![]);
        let closed = Arc::clone(&landmarks.closed);
        let mut s = RenderSession::new(
            Box::new(CpuFrameCompositor::new()),
            Box::new(landmarks),
            Box::new(StubLoader),
            SessionConfig::default(),
        );
        s.close();
        s.close();
        assert!(closed.load(Ordering::SeqCst));
        assert!(s.is_closed());
        assert!(s.step(&video(0), 0.0).is_err());
    }

    #[test]
    fn test_full_frame_filter_covers_canvas() {
        let mut s = session(vec![(0, FaceObservation::NoFace)]);
        let frame_filter = Filter {
            id: "frame".into(),
            name: "Frame".into(),
            asset: "frame.png".into(),
            full_frame: true,
        };
        s.select_filter(&frame_filter).unwrap();
        let out = s.step(&video(0), 1.0).unwrap();
        let t = visible(&out.placement);
        assert_relative_eq!(t.rotation, 0.0);
        assert_eq!(pixel(&out.frame, 0, 0), [255, 0, 0]);
        assert_eq!(pixel(&out.frame, 319, 239), [255, 0, 0]);
    }
}

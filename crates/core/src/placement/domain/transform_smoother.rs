use super::mask_transform::MaskTransform;

/// Fraction of the remaining distance covered per frame.
pub const DEFAULT_SMOOTHING: f64 = 0.35;

/// Exponential smoothing of the placed mask across frames.
///
/// Formula: `smoothed[t] = prev + factor * (target - prev)`
///
/// The first target after construction or [`reset`](Self::reset) is returned
/// unchanged. The gap to a constant target shrinks by `1 - factor` each step.
pub struct TransformSmoother {
    factor: f64,
    previous: Option<MaskTransform>,
}

impl TransformSmoother {
    /// `factor` is clamped to (0, 1]; non-finite values fall back to the default.
    pub fn new(factor: f64) -> Self {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor.min(1.0)
        } else {
            log::warn!("Invalid smoothing factor {factor}, using {DEFAULT_SMOOTHING}");
            DEFAULT_SMOOTHING
        };
        Self {
            factor,
            previous: None,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn smooth(&mut self, target: MaskTransform) -> MaskTransform {
        let smoothed = match &self.previous {
            None => target,
            Some(prev) => prev.lerp(&target, self.factor),
        };
        self.previous = Some(smoothed);
        smoothed
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&MaskTransform> {
        self.previous.as_ref()
    }
}

impl Default for TransformSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

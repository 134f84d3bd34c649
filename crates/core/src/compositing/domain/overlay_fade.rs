use crate::shared::constants::OVERLAY_FADE_SECONDS;

/// Opacity ramp for the overlay layer when the mask appears or disappears.
///
/// Each flip restarts the ramp from the current opacity, eased out
/// quadratically: `opacity = from + (to - from) * (1 - (1 - t)^2)`.
#[derive(Clone, Debug)]
pub struct OverlayFade {
    duration: f64,
    from: f64,
    to: f64,
    elapsed: f64,
    opacity: f64,
}

impl OverlayFade {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            from: 0.0,
            to: 0.0,
            elapsed: 0.0,
            opacity: 0.0,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        let to = if visible { 1.0 } else { 0.0 };
        if to == self.to {
            return;
        }
        self.from = self.opacity;
        self.to = to;
        self.elapsed = 0.0;
    }

    /// Advances the ramp by `dt` seconds and returns the new opacity.
    pub fn advance(&mut self, dt: f64) -> f64 {
        self.elapsed += dt.max(0.0);
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.opacity = self.from + (self.to - self.from) * eased;
        self.opacity
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}

impl Default for OverlayFade {
    fn default() -> Self {
        Self::new(OVERLAY_FADE_SECONDS)
    }
}

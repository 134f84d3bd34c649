/// Shrink applied to face-anchored masks on displays narrower than the canvas.
pub const MIN_FRAME_SCALE: f64 = 0.75;
pub const MAX_FRAME_SCALE: f64 = 1.0;

/// Pixel size of the drawing surface, plus the size it is shown at.
///
/// A portrait phone showing a landscape camera crops the sides; the mask is
/// scaled down so it still reads as face-sized in the visible region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasGeometry {
    pub width: u32,
    pub height: u32,
    pub display: Option<(f64, f64)>,
}

impl CanvasGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            display: None,
        }
    }

    pub fn with_display(mut self, width: f64, height: f64) -> Self {
        self.display = Some((width, height));
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn frame_scale(&self) -> f64 {
        if self.is_degenerate() {
            return MAX_FRAME_SCALE;
        }
        let Some((dw, dh)) = self.display else {
            return MAX_FRAME_SCALE;
        };
        if !(dw.is_finite() && dh.is_finite()) || dw <= 0.0 || dh <= 0.0 {
            return MAX_FRAME_SCALE;
        }

        let display_aspect = dw / dh;
        let canvas_aspect = self.aspect();
        if display_aspect >= canvas_aspect {
            return MAX_FRAME_SCALE;
        }
        (display_aspect / canvas_aspect)
            .sqrt()
            .clamp(MIN_FRAME_SCALE, MAX_FRAME_SCALE)
    }
}

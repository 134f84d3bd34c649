/// Where and how large the mask is drawn on the canvas.
///
/// `x`/`y` is the mask center in canvas pixels; `rotation` is in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaskTransform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl MaskTransform {
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    /// Moves every field a fraction `t` of the way toward `target`.
    pub fn lerp(&self, target: &MaskTransform, t: f64) -> MaskTransform {
        let step = |from: f64, to: f64| from + t * (to - from);
        MaskTransform {
            x: step(self.x, target.x),
            y: step(self.y, target.y),
            width: step(self.width, target.width),
            height: step(self.height, target.height),
            rotation: step(self.rotation, target.rotation),
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Axis-aligned extent of the rotated rectangle: `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let (sin, cos) = self.rotation.sin_cos();
        let half_w = (self.width * cos.abs() + self.height * sin.abs()) / 2.0;
        let half_h = (self.width * sin.abs() + self.height * cos.abs()) / 2.0;
        (
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lerp_halfway() {
        let a = MaskTransform::new(0.0, 0.0, 10.0, 20.0, 0.0);
        let b = MaskTransform::new(10.0, 20.0, 30.0, 40.0, 1.0);
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.x, 5.0);
        assert_relative_eq!(mid.y, 10.0);
        assert_relative_eq!(mid.width, 20.0);
        assert_relative_eq!(mid.height, 30.0);
        assert_relative_eq!(mid.rotation, 0.5);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = MaskTransform::new(1.0, 2.0, 3.0, 4.0, 0.1);
        let b = MaskTransform::new(5.0, 6.0, 7.0, 8.0, 0.2);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn test_bounding_box_unrotated() {
        let t = MaskTransform::new(50.0, 40.0, 20.0, 10.0, 0.0);
        let (x0, y0, x1, y1) = t.bounding_box();
        assert_relative_eq!(x0, 40.0);
        assert_relative_eq!(y0, 35.0);
        assert_relative_eq!(x1, 60.0);
        assert_relative_eq!(y1, 45.0);
    }

    #[test]
    fn test_bounding_box_quarter_turn_swaps_extent() {
        let t = MaskTransform::new(0.0, 0.0, 20.0, 10.0, std::f64::consts::FRAC_PI_2);
        let (x0, y0, x1, y1) = t.bounding_box();
        assert_relative_eq!(x1 - x0, 10.0, epsilon = 1e-9);
        assert_relative_eq!(y1 - y0, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_detected() {
        let mut t = MaskTransform::new(0.0, 0.0, 1.0, 1.0, 0.0);
        assert!(t.is_finite());
        t.width = f64::NAN;
        assert!(!t.is_finite());
    }
}

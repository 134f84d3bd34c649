use ndarray::s;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::filters::domain::mask_image::MaskImage;
use crate::placement::domain::mask_transform::MaskTransform;
use crate::shared::frame::{Frame, RGB, RGBA};

/// CPU implementation of the two-layer renderer.
///
/// The mask is drawn by inverse-mapping every overlay pixel inside the
/// rotated mask's bounding box back into mask space and sampling it
/// bilinearly in premultiplied alpha.
#[derive(Default)]
pub struct CpuFrameCompositor;

impl CpuFrameCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl FrameCompositor for CpuFrameCompositor {
    fn draw_video(&self, video: &Frame, base: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        if video.channels() < RGB {
            return Err(format!("expected an RGB video frame, got {} channels", video.channels()).into());
        }
        if !base.same_size(video) || base.channels() != RGB {
            *base = Frame::blank(video.width(), video.height(), RGB);
        }

        let rgb = RGB as usize;
        let src = video.as_ndarray();
        base.as_ndarray_mut().assign(&src.slice(s![.., ..;-1, ..rgb]));
        base.set_index(video.index());
        Ok(())
    }

    fn draw_mask(
        &self,
        mask: &MaskImage,
        transform: Option<&MaskTransform>,
        overlay: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if overlay.channels() != RGBA {
            return Err(format!("overlay must be RGBA, got {} channels", overlay.channels()).into());
        }
        overlay.clear();

        let Some(t) = transform else {
            return Ok(());
        };
        if mask.is_empty() || t.width <= 0.0 || t.height <= 0.0 || !t.is_finite() {
            return Ok(());
        }

        let ow = overlay.width() as usize;
        let oh = overlay.height() as usize;
        let (min_x, min_y, max_x, max_y) = t.bounding_box();
        let x0 = min_x.floor().max(0.0) as usize;
        let y0 = min_y.floor().max(0.0) as usize;
        let x1 = (max_x.ceil().max(0.0) as usize).min(ow);
        let y1 = (max_y.ceil().max(0.0) as usize).min(oh);

        let (sin, cos) = t.rotation.sin_cos();
        let mw = mask.width() as f64;
        let mh = mask.height() as f64;
        let data = overlay.data_mut();

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - t.x;
                let dy = py as f64 + 0.5 - t.y;
                // Undo the rotation to land in the mask's own frame
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                let mx = (u / t.width + 0.5) * mw;
                let my = (v / t.height + 0.5) * mh;
                if mx < 0.0 || my < 0.0 || mx >= mw || my >= mh {
                    continue;
                }

                let src = sample_bilinear(mask, mx - 0.5, my - 0.5);
                if src[3] <= 0.0 {
                    continue;
                }
                let idx = (py * ow + px) * RGBA as usize;
                source_over(&mut data[idx..idx + RGBA as usize], src);
            }
        }
        Ok(())
    }

    fn compose(
        &self,
        base: &Frame,
        overlay: &Frame,
        opacity: f64,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        if !base.same_size(overlay) {
            return Err(format!(
                "layer size mismatch: base {}x{}, overlay {}x{}",
                base.width(),
                base.height(),
                overlay.width(),
                overlay.height()
            )
            .into());
        }
        if base.channels() != RGB || overlay.channels() != RGBA {
            return Err("compose expects an RGB base and an RGBA overlay".into());
        }

        let mut out = base.clone();
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(out);
        }

        for (dst, src) in out
            .data_mut()
            .chunks_exact_mut(RGB as usize)
            .zip(overlay.data().chunks_exact(RGBA as usize))
        {
            let a = src[3] as f64 / 255.0 * opacity;
            if a <= 0.0 {
                continue;
            }
            for c in 0..RGB as usize {
                let blended = dst[c] as f64 * (1.0 - a) + src[c] as f64 * a;
                dst[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(out)
    }
}

/// Premultiplied RGBA in [0, 1] at a fractional pixel position, edges clamped.
fn sample_bilinear(mask: &MaskImage, fx: f64, fy: f64) -> [f64; 4] {
    let img = mask.pixels();
    let max_x = (img.width() - 1) as f64;
    let max_y = (img.height() - 1) as f64;
    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let premul = |x: u32, y: u32| {
        let p = img.get_pixel(x, y).0;
        let a = p[3] as f64 / 255.0;
        [
            p[0] as f64 / 255.0 * a,
            p[1] as f64 / 255.0 * a,
            p[2] as f64 / 255.0 * a,
            a,
        ]
    };
    let (p00, p10, p01, p11) = (premul(x0, y0), premul(x1, y0), premul(x0, y1), premul(x1, y1));

    let mut out = [0.0; 4];
    for i in 0..4 {
        let top = p00[i] + (p10[i] - p00[i]) * tx;
        let bottom = p01[i] + (p11[i] - p01[i]) * tx;
        out[i] = top + (bottom - top) * ty;
    }
    out
}

/// Blends a premultiplied source over a straight-alpha destination pixel.
fn source_over(dst: &mut [u8], src: [f64; 4]) {
    let da = dst[3] as f64 / 255.0;
    let keep = 1.0 - src[3];
    let out_a = src[3] + da * keep;
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let d = dst[c] as f64 / 255.0 * da;
        let premul = src[c] + d * keep;
        dst[c] = to_byte(premul / out_a);
    }
    dst[3] = to_byte(out_a);
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    fn solid_mask(w: u32, h: u32, color: [u8; 4]) -> MaskImage {
        MaskImage::new(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    fn alpha_at(overlay: &Frame, x: usize, y: usize) -> u8 {
        overlay.data()[(y * overlay.width() as usize + x) * 4 + 3]
    }

    #[test]
    fn test_draw_video_mirrors_horizontally() {
        let data = vec![
            1, 1, 1, 2, 2, 2, 3, 3, 3, //
            4, 4, 4, 5, 5, 5, 6, 6, 6,
        ];
        let video = Frame::new(data, 3, 2, 3, 7);
        let mut base = Frame::blank(1, 1, RGB);
        CpuFrameCompositor::new().draw_video(&video, &mut base).unwrap();

        assert_eq!((base.width(), base.height()), (3, 2));
        assert_eq!(base.index(), 7);
        assert_eq!(
            base.data(),
            &[3, 3, 3, 2, 2, 2, 1, 1, 1, 6, 6, 6, 5, 5, 5, 4, 4, 4]
        );
    }

    #[test]
    fn test_draw_video_drops_alpha_channel() {
        let video = Frame::new(vec![10, 20, 30, 255, 40, 50, 60, 255], 2, 1, 4, 0);
        let mut base = Frame::blank(2, 1, RGB);
        CpuFrameCompositor::new().draw_video(&video, &mut base).unwrap();
        assert_eq!(base.data(), &[40, 50, 60, 10, 20, 30]);
    }

    #[test]
    fn test_draw_mask_covers_transform_rect() {
        let mut overlay = Frame::blank(10, 10, RGBA);
        let mask = solid_mask(2, 2, [255, 0, 0, 255]);
        let t = MaskTransform::new(5.0, 5.0, 4.0, 4.0, 0.0);
        CpuFrameCompositor::new()
            .draw_mask(&mask, Some(&t), &mut overlay)
            .unwrap();

        for y in 0..10 {
            for x in 0..10 {
                let inside = (3..7).contains(&x) && (3..7).contains(&y);
                assert_eq!(alpha_at(&overlay, x, y) == 255, inside, "pixel ({x}, {y})");
            }
        }
        let idx = (4 * 10 + 4) * 4;
        assert_eq!(&overlay.data()[idx..idx + 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_draw_mask_rotation_swaps_extent() {
        let mut overlay = Frame::blank(10, 10, RGBA);
        let mask = solid_mask(4, 2, [0, 255, 0, 255]);
        let t = MaskTransform::new(5.0, 5.0, 4.0, 2.0, std::f64::consts::FRAC_PI_2);
        CpuFrameCompositor::new()
            .draw_mask(&mask, Some(&t), &mut overlay)
            .unwrap();

        // Tall after a quarter turn
        assert_eq!(alpha_at(&overlay, 5, 3), 255);
        assert_eq!(alpha_at(&overlay, 3, 5), 0);
    }

    #[test]
    fn test_draw_mask_clears_previous_frame() {
        let mut overlay = Frame::blank(4, 4, RGBA);
        overlay.data_mut().fill(200);
        let mask = solid_mask(2, 2, [255, 255, 255, 255]);
        CpuFrameCompositor::new()
            .draw_mask(&mask, None, &mut overlay)
            .unwrap();
        assert!(overlay.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_mask_off_canvas_is_clipped() {
        let mut overlay = Frame::blank(4, 4, RGBA);
        let mask = solid_mask(2, 2, [255, 255, 255, 255]);
        let t = MaskTransform::new(0.0, 0.0, 4.0, 4.0, 0.3);
        CpuFrameCompositor::new()
            .draw_mask(&mask, Some(&t), &mut overlay)
            .unwrap();
        assert_eq!(alpha_at(&overlay, 0, 0), 255);
        assert_eq!(alpha_at(&overlay, 3, 3), 0);
    }

    #[test]
    fn test_draw_mask_rejects_rgb_overlay() {
        let mut overlay = Frame::blank(4, 4, RGB);
        let mask = solid_mask(2, 2, [255, 255, 255, 255]);
        assert!(CpuFrameCompositor::new()
            .draw_mask(&mask, None, &mut overlay)
            .is_err());
    }

    #[rstest]
    #[case(255, 1.0, 200)]
    #[case(255, 0.0, 100)]
    #[case(255, 0.5, 150)]
    #[case(128, 1.0, 150)]
    #[case(0, 1.0, 100)]
    fn test_compose_blends_by_alpha_and_opacity(
        #[case] alpha: u8,
        #[case] opacity: f64,
        #[case] expected: u8,
    ) {
        let base = Frame::new(vec![100; 3], 1, 1, RGB, 0);
        let overlay = Frame::new(vec![200, 200, 200, alpha], 1, 1, RGBA, 0);
        let out = CpuFrameCompositor::new()
            .compose(&base, &overlay, opacity)
            .unwrap();
        assert_eq!(out.data(), &[expected; 3]);
    }

    #[test]
    fn test_compose_rejects_size_mismatch() {
        let base = Frame::blank(2, 2, RGB);
        let overlay = Frame::blank(3, 2, RGBA);
        assert!(CpuFrameCompositor::new().compose(&base, &overlay, 1.0).is_err());
    }
}

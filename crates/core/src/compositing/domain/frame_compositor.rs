use crate::filters::domain::mask_image::MaskImage;
use crate::placement::domain::mask_transform::MaskTransform;
use crate::shared::frame::Frame;

/// Domain interface for the two-layer renderer.
///
/// The base layer holds the mirrored camera image (RGB), the overlay layer
/// holds the mask (straight RGBA). Layers are owned by the caller and reused
/// across frames.
pub trait FrameCompositor: Send {
    /// Draws `video` mirrored horizontally into `base`, resizing `base` if the
    /// camera resolution changed.
    fn draw_video(&self, video: &Frame, base: &mut Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Clears `overlay`, then draws `mask` at `transform` if one is given.
    fn draw_mask(
        &self,
        mask: &MaskImage,
        transform: Option<&MaskTransform>,
        overlay: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Blends `overlay` over `base` with the overlay alpha scaled by `opacity`.
    fn compose(
        &self,
        base: &Frame,
        overlay: &Frame,
        opacity: f64,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}

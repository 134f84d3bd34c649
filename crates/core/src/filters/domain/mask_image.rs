use image::RgbaImage;

/// Decoded mask artwork, straight (non-premultiplied) RGBA.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskImage {
    pixels: RgbaImage,
}

impl MaskImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Height / width; 0 for an empty image.
    pub fn aspect_ratio(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.height() as f64 / self.width() as f64
    }
}

use super::filter::Filter;
use super::mask_image::MaskImage;

/// Domain interface for turning a filter's asset reference into pixels.
pub trait MaskLoader: Send {
    fn load(&self, filter: &Filter) -> Result<MaskImage, Box<dyn std::error::Error>>;
}

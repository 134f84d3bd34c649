use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::filters::domain::filter::Filter;
use crate::filters::domain::mask_image::MaskImage;
use crate::filters::domain::mask_loader::MaskLoader;
use crate::shared::asset_resolver::{self, AssetResolveError};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Resolve(#[from] AssetResolveError),
    #[error("failed to decode mask image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("mask image {0} has no pixels")]
    Empty(PathBuf),
}

/// Loads mask PNGs from the masks directory, or downloads remote ones into
/// the user cache first.
pub struct FileMaskLoader {
    assets_dir: PathBuf,
}

impl FileMaskLoader {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    fn load_asset(&self, asset: &str) -> Result<MaskImage, AssetError> {
        let path = asset_resolver::resolve(asset, &self.assets_dir)?;
        let decoded = image::open(&path).map_err(|e| AssetError::Decode {
            path: path.clone(),
            source: e,
        })?;
        let mask = MaskImage::new(decoded.into_rgba8());
        if mask.is_empty() {
            return Err(AssetError::Empty(path));
        }
        log::debug!(
            "Decoded mask {} ({}x{})",
            path.display(),
            mask.width(),
            mask.height()
        );
        Ok(mask)
    }
}

impl MaskLoader for FileMaskLoader {
    fn load(&self, filter: &Filter) -> Result<MaskImage, Box<dyn std::error::Error>> {
        Ok(self.load_asset(&filter.asset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_loads_relative_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("masks")).unwrap();
        let mut img = RgbaImage::new(4, 6);
        img.put_pixel(1, 1, Rgba([255, 0, 0, 128]));
        img.save(dir.path().join("masks/0.png")).unwrap();

        let loader = FileMaskLoader::new(dir.path());
        let mask = loader
            .load(&Filter::face_mask("0", "Mask 1", "/masks/0.png"))
            .unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 6));
        assert_eq!(mask.pixels().get_pixel(1, 1), &Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_missing_asset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileMaskLoader::new(dir.path());
        let err = loader.load_asset("masks/9.png").unwrap_err();
        assert!(matches!(err, AssetError::Resolve(AssetResolveError::NotFound(_))));
    }

    #[test]
    fn test_undecodable_asset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        let loader = FileMaskLoader::new(dir.path());
        let err = loader.load_asset("bad.png").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}

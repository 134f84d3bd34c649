use std::io::Cursor;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::shared::constants::CAPTURE_FILE_PREFIX;
use crate::shared::frame::{Frame, RGB, RGBA};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("nothing to capture yet")]
    NoFrame,
    #[error("frame data does not match {width}x{height}x{channels}")]
    InvalidFrame { width: u32, height: u32, channels: u8 },
    #[error("failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write capture to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to share capture: {0}")]
    Share(#[source] std::io::Error),
}

/// A point-in-time PNG snapshot of the composited frame.
#[derive(Clone, Debug)]
pub struct CapturedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
    captured_at: DateTime<Local>,
}

impl CapturedImage {
    pub fn from_frame(frame: &Frame, captured_at: DateTime<Local>) -> Result<Self, CaptureError> {
        let invalid = || CaptureError::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
        };
        let data = frame.data().to_vec();
        let image = match frame.channels() {
            RGB => image::DynamicImage::ImageRgb8(
                image::RgbImage::from_raw(frame.width(), frame.height(), data).ok_or_else(invalid)?,
            ),
            RGBA => image::DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(frame.width(), frame.height(), data)
                    .ok_or_else(invalid)?,
            ),
            _ => return Err(invalid()),
        };

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(Self {
            png,
            width: frame.width(),
            height: frame.height(),
            captured_at,
        })
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// `BreakABoo_YYYY-MM-DD-HH-MM-SS.png` in local time.
    pub fn suggested_filename(&self) -> String {
        format!(
            "{CAPTURE_FILE_PREFIX}{}.png",
            self.captured_at.format("%Y-%m-%d-%H-%M-%S")
        )
    }
}

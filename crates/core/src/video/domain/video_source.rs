use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::constants::CAMERA_PERMISSION_MESSAGE;

/// Where frames come from: the camera, or a file standing in for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    File(PathBuf),
    /// Platform device name, e.g. `/dev/video0` or avfoundation's `0`.
    Camera(String),
}

impl VideoSource {
    pub fn default_camera() -> Self {
        VideoSource::Camera(default_camera_device().to_string())
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, VideoSource::Camera(_))
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::File(path) => write!(f, "{}", path.display()),
            VideoSource::Camera(device) => write!(f, "camera {device}"),
        }
    }
}

pub fn default_camera_device() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
}

/// Camera acquisition failures. All are fatal to the session.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("{CAMERA_PERMISSION_MESSAGE}")]
    PermissionDenied { device: String },
    #[error("camera {device} unavailable: {reason}")]
    Unavailable { device: String, reason: String },
    #[error("camera {device} stream could not be decoded: {reason}")]
    Decode { device: String, reason: String },
}

impl CameraError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CameraError::PermissionDenied { .. })
    }
}

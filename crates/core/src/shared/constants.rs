pub const APP_NAME: &str = "BreakABoo";

/// Prefix of downloaded capture filenames: `BreakABoo_2025-10-31-21-04-59.png`.
pub const CAPTURE_FILE_PREFIX: &str = "BreakABoo_";
pub const SHARE_FILE_NAME: &str = "break-a-boo.png";

pub const CAMERA_PERMISSION_MESSAGE: &str = "Please allow camera access to use the face filters 👻";

/// Requested camera stream; drivers may negotiate something else.
pub const IDEAL_CAMERA_WIDTH: u32 = 1280;
pub const IDEAL_CAMERA_HEIGHT: u32 = 720;
pub const IDEAL_CAMERA_FPS: u32 = 30;

pub const MIN_MASK_SIZE: f64 = 0.5;
pub const MAX_MASK_SIZE: f64 = 2.0;
pub const MASK_SIZE_STEP: f64 = 0.05;
pub const DEFAULT_MASK_SIZE: f64 = 1.0;

/// Overlay fade-in/fade-out duration when the mask appears or disappears.
pub const OVERLAY_FADE_SECONDS: f64 = 0.16;

pub const DEFAULT_MASKS_DIR: &str = "masks";
pub const DEFAULT_FILTER_COUNT: usize = 15;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

use std::path::Path;

use crate::shared::constants::{IDEAL_CAMERA_FPS, IDEAL_CAMERA_HEIGHT, IDEAL_CAMERA_WIDTH};
use crate::shared::frame::{Frame, RGB};
use crate::shared::video_metadata::{VideoMetadata, FALLBACK_FPS};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_source::{CameraError, VideoSource};

/// libavdevice input format for the platform camera.
const CAMERA_INPUT_FORMAT: &str = if cfg!(target_os = "macos") {
    "avfoundation"
} else if cfg!(target_os = "windows") {
    "dshow"
} else {
    "v4l2"
};

const EPERM: i32 = 1;
const EACCES: i32 = 13;

/// Decodes camera or file frames via ffmpeg-next (libavdevice +
/// libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`].
pub struct FfmpegReader {
    decoding: Option<Decoding>,
    metadata: Option<VideoMetadata>,
}

struct Decoding {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<Scaler>,
    video_stream_index: usize,
}

struct Scaler {
    context: ffmpeg_next::software::scaling::Context,
    format: ffmpeg_next::format::Pixel,
    width: u32,
    height: u32,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            decoding: None,
            metadata: None,
        }
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match source {
            VideoSource::File(path) => ffmpeg_next::format::input(path)?,
            VideoSource::Camera(device) => open_camera(device)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 && rate.numerator() > 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else if source.is_camera() {
            IDEAL_CAMERA_FPS as f64
        } else {
            FALLBACK_FPS
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: if source.is_camera() {
                0
            } else {
                stream.frames().max(0) as usize
            },
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: match source {
                VideoSource::File(path) => Some(path.clone()),
                VideoSource::Camera(_) => None,
            },
        };
        log::info!(
            "Opened {source}: {}x{} @ {:.1} fps ({})",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        drop(stream);
        self.decoding = Some(Decoding {
            ictx,
            decoder,
            scaler: None,
            video_stream_index,
        });
        self.metadata = Some(metadata.clone());

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(decoding) = self.decoding.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        Box::new(FfmpegFrameIter {
            decoding,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        if self.decoding.take().is_some() {
            log::debug!("Released video source");
        }
        self.metadata = None;
    }
}

/// Opens the platform camera through libavdevice, asking for the ideal
/// 1280x720 @ 30 fps stream. The device may pick the nearest mode it supports.
fn open_camera(device: &str) -> Result<ffmpeg_next::format::context::Input, CameraError> {
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAMERA_INPUT_FORMAT)
        .ok_or_else(|| CameraError::Unavailable {
            device: device.to_string(),
            reason: format!("ffmpeg was built without {CAMERA_INPUT_FORMAT} support"),
        })?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set(
        "video_size",
        &format!("{IDEAL_CAMERA_WIDTH}x{IDEAL_CAMERA_HEIGHT}"),
    );
    options.set("framerate", &IDEAL_CAMERA_FPS.to_string());

    let ctx = ffmpeg_next::format::open_with(
        &device,
        &ffmpeg_next::format::Format::Input(format),
        options,
    )
    .map_err(|e| camera_error(device, e))?;

    match ctx {
        ffmpeg_next::format::context::Context::Input(input) => Ok(input),
        ffmpeg_next::format::context::Context::Output(_) => Err(CameraError::Unavailable {
            device: device.to_string(),
            reason: "device opened as an output".to_string(),
        }),
    }
}

fn camera_error(device: &str, e: ffmpeg_next::Error) -> CameraError {
    match e {
        ffmpeg_next::Error::Other { errno } if errno == EPERM || errno == EACCES => {
            CameraError::PermissionDenied {
                device: device.to_string(),
            }
        }
        ffmpeg_next::Error::InvalidData => CameraError::Decode {
            device: device.to_string(),
            reason: e.to_string(),
        },
        other => CameraError::Unavailable {
            device: device.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Lazy iterator that decodes frames one at a time, so a live camera never
/// has to be buffered.
struct FfmpegFrameIter<'a> {
    decoding: &'a mut Decoding,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoding.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        Some(self.convert(&decoded))
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let (format, width, height) = (decoded.format(), decoded.width(), decoded.height());

        // Cameras can renegotiate their mode mid-stream
        let stale = self
            .decoding
            .scaler
            .as_ref()
            .map_or(true, |s| s.format != format || s.width != width || s.height != height);
        if stale {
            let context = ffmpeg_next::software::scaling::Context::get(
                format,
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?;
            self.decoding.scaler = Some(Scaler {
                context,
                format,
                width,
                height,
            });
        }
        let scaler = self
            .decoding
            .scaler
            .as_mut()
            .ok_or("FfmpegReader: scaler missing")?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.context.run(decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, RGB, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.decoding.ictx.packets().next() else {
                let _ = self.decoding.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.decoding.video_stream_index {
                continue;
            }

            if self.decoding.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

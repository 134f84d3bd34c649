use chrono::{DateTime, Local};

use crate::capture::domain::capture_exporter::{CaptureExporter, ExportOutcome};
use crate::capture::domain::captured_image::CaptureError;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_source::VideoSource;

use super::render_session::RenderSession;

/// Still capture: read → render up to a frame → capture → export.
///
/// Frames before the target run through the session normally so smoothing
/// settles; the capture itself ignores the fade.
pub struct CaptureStillUseCase {
    reader: Box<dyn VideoReader>,
    session: RenderSession,
    exporter: Box<dyn CaptureExporter>,
}

impl CaptureStillUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        session: RenderSession,
        exporter: Box<dyn CaptureExporter>,
    ) -> Self {
        Self {
            reader,
            session,
            exporter,
        }
    }

    pub fn session_mut(&mut self) -> &mut RenderSession {
        &mut self.session
    }

    /// Renders frames `0..=at_frame` (or until the source ends) and exports
    /// the last one. `None` captures the first frame.
    pub fn execute(
        &mut self,
        source: &VideoSource,
        at_frame: Option<usize>,
        captured_at: DateTime<Local>,
    ) -> Result<ExportOutcome, Box<dyn std::error::Error>> {
        let result = self.run(source, at_frame.unwrap_or(0), captured_at);
        self.reader.close();
        self.session.close();
        result
    }

    fn run(
        &mut self,
        source: &VideoSource,
        at_frame: usize,
        captured_at: DateTime<Local>,
    ) -> Result<ExportOutcome, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(source)?;
        let dt = metadata.frame_interval();

        let mut rendered = 0;
        for next in self.reader.frames() {
            let video = match next {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Dropping undecodable frame: {e}");
                    continue;
                }
            };
            let index = video.index();
            self.session.step(&video, dt)?;
            rendered += 1;
            if index >= at_frame {
                break;
            }
        }
        if rendered == 0 {
            return Err(Box::new(CaptureError::NoFrame));
        }

        let image = self.session.capture(captured_at)?;
        log::info!(
            "Captured {}x{} frame ({} bytes)",
            image.width(),
            image.height(),
            image.png().len()
        );
        self.exporter.export(&image)
    }
}

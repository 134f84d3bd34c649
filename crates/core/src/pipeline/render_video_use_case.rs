use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_source::VideoSource;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::{PipelineLogger, OVERLAY_FRAMES};
use super::render_session::RenderSession;

/// Progress callback: `(frames_rendered, total_frames)`; `total_frames` is 0
/// for live sources. Returning `false` stops the session.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: usize,
    pub overlay_frames: usize,
    pub skipped_frames: usize,
}

/// Drives a render session from a camera or file: read, render, write.
///
/// The source is acquired before the loop starts, so a camera permission
/// failure surfaces from `execute` before any frame is scheduled. The
/// reader, writer and session are released on every exit path.
pub struct RenderVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Option<Box<dyn VideoWriter>>,
    session: RenderSession,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
    max_frames: Option<usize>,
}

impl RenderVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Option<Box<dyn VideoWriter>>,
        session: RenderSession,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            session,
            logger,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            max_frames: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Stop after this many frames (live cameras never end on their own).
    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut RenderSession {
        &mut self.session
    }

    pub fn execute(
        &mut self,
        source: &VideoSource,
        output_path: Option<&Path>,
    ) -> Result<RenderStats, Box<dyn std::error::Error>> {
        let result = self.run(source, output_path);

        self.reader.close();
        let closed = match self.writer.as_mut() {
            Some(writer) => writer.close(),
            None => Ok(()),
        };
        self.session.close();
        self.logger.summary();

        let stats = result?;
        closed?;
        Ok(stats)
    }

    fn run(
        &mut self,
        source: &VideoSource,
        output_path: Option<&Path>,
    ) -> Result<RenderStats, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(source)?;
        self.logger.info(&format!(
            "Rendering {source} ({}x{} @ {:.1} fps)",
            metadata.width, metadata.height, metadata.fps
        ));

        if let (Some(writer), Some(path)) = (self.writer.as_mut(), output_path) {
            writer.open(path, &metadata)?;
        }

        let total = match self.max_frames {
            Some(max) if metadata.is_live() => max,
            Some(max) => max.min(metadata.total_frames),
            None => metadata.total_frames,
        };
        let dt = metadata.frame_interval();
        let mut stats = RenderStats::default();
        let mut frames = self.reader.frames();

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                self.logger.info("Render cancelled");
                break;
            }
            if self.max_frames.is_some_and(|max| stats.frames >= max) {
                break;
            }

            let t0 = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            let video = match next {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Dropping undecodable frame: {e}");
                    stats.skipped_frames += 1;
                    continue;
                }
            };
            self.logger.timing("source", elapsed_ms(t0));

            let t1 = Instant::now();
            let rendered = match self.session.step(&video, dt) {
                Ok(rendered) => rendered,
                Err(e) => {
                    log::warn!("Skipping frame {}: {e}", video.index());
                    stats.skipped_frames += 1;
                    continue;
                }
            };
            self.logger.timing("render", elapsed_ms(t1));
            self.logger.metric("opacity", rendered.opacity);
            if rendered.placement.is_visible() {
                stats.overlay_frames += 1;
                self.logger.count(OVERLAY_FRAMES);
            }

            if let Some(writer) = self.writer.as_mut().filter(|_| output_path.is_some()) {
                let t2 = Instant::now();
                writer.write(&rendered.frame)?;
                self.logger.timing("write", elapsed_ms(t2));
            }

            stats.frames += 1;
            self.logger.progress(stats.frames, total);
            if let Some(callback) = &self.on_progress {
                if !callback(stats.frames, total) {
                    self.logger.info("Render stopped by progress callback");
                    break;
                }
            }
        }

        self.logger.info(&format!(
            "Rendered {} frames ({} with mask, {} skipped)",
            stats.frames, stats.overlay_frames, stats.skipped_frames
        ));
        Ok(stats)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

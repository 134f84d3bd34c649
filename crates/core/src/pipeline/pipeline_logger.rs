use std::collections::HashMap;
use std::time::Instant;

/// Counter bumped once per frame that carried a visible mask.
pub const OVERLAY_FRAMES: &str = "overlay_frames";

/// Cross-cutting logger for render session events.
///
/// Decouples use cases from specific output mechanisms (stdout, log crate,
/// a future preview window) so each caller can observe the render loop
/// without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 for live sources.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage (`source`, `render`, `write`) took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. overlay opacity).
    fn metric(&mut self, name: &str, value: f64);

    /// Increment a named event counter.
    fn count(&mut self, name: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by capture and by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn count(&mut self, _name: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing, metrics and counters,
/// and reports a summary when the session ends.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    counters: HashMap<String, usize>,
    start_time: Instant,
    frames_seen: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            counters: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        self.summary_for(elapsed_secs)
    }

    fn summary_for(&self, elapsed_secs: f64) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.counters.is_empty() {
            return None;
        }

        let elapsed_ms = elapsed_secs * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Session summary ({frames} frames, {elapsed_secs:.1}s total):"
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.2}"));
        }

        let mut counter_names: Vec<_> = self.counters.keys().collect();
        counter_names.sort();
        for name in counter_names {
            lines.push(format!("  {name}: {}", self.counters[name]));
        }

        if elapsed_secs > 0.0 {
            if frames > 0 {
                lines.push(format!("  Throughput: {:.1} fps", frames as f64 / elapsed_secs));
            }
            if let Some(&overlay) = self.counters.get(OVERLAY_FRAMES) {
                lines.push(format!("  Overlay rate: {:.1} fps", overlay as f64 / elapsed_secs));
            }
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = self.frames_seen.max(current);
        if total == 0 {
            if current % self.throttle_frames == 0 {
                log::info!("Rendered {current} frames");
            }
        } else if current % self.throttle_frames == 0 || current == total {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Rendering: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn count(&mut self, name: &str) {
        *self.counters.entry(name.to_string()).or_default() += 1;
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("render", 5.0);
        logger.metric("opacity", 1.0);
        logger.count(OVERLAY_FRAMES);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("render", 20.0);
        logger.timing("render", 30.0);
        logger.timing("write", 5.0);

        assert_eq!(logger.timings_for("render").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("write").unwrap(), &[5.0]);
        assert!(logger.timings_for("source").is_none());
    }

    #[test]
    fn test_counter_increments() {
        let mut logger = StdoutPipelineLogger::new(10);
        assert_eq!(logger.counter(OVERLAY_FRAMES), 0);
        logger.count(OVERLAY_FRAMES);
        logger.count(OVERLAY_FRAMES);
        assert_eq!(logger.counter(OVERLAY_FRAMES), 2);
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_rates() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(60, 0);
        logger.timing("render", 4.0);
        logger.metric("opacity", 0.5);
        logger.metric("opacity", 1.0);
        for _ in 0..30 {
            logger.count(OVERLAY_FRAMES);
        }

        let summary = logger.summary_for(2.0).unwrap();
        assert!(summary.contains("Session summary (60 frames"));
        assert!(summary.contains("render"));
        assert!(summary.contains("opacity: avg 0.75"));
        assert!(summary.contains("overlay_frames: 30"));
        assert!(summary.contains("Throughput: 30.0 fps"));
        assert!(summary.contains("Overlay rate: 15.0 fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_for_live_sources() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 25);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("Selected filter 3");
        assert_eq!(logger.messages, vec!["Selected filter 3".to_string()]);
    }

    #[test]
    fn test_metric_average() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("opacity", 0.25);
        logger.metric("opacity", 0.75);
        let values = logger.metrics_for("opacity").unwrap();
        assert_relative_eq!(values.iter().sum::<f64>() / values.len() as f64, 0.5);
    }

    #[test]
    fn test_default_throttle() {
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 30);
    }
}

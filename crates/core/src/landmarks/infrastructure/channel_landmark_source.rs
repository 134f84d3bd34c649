use std::collections::VecDeque;
use std::io::BufRead;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::landmarks::domain::landmark_source::{FaceObservation, LandmarkSource};
use crate::shared::frame::Frame;

use super::landmark_track::{parse_record, LandmarkResult};

/// Queue bound for unbounded channels.
const DEFAULT_MAX_PENDING: usize = 64;

/// Live detector boundary: results are pushed from the detector's thread and
/// drained without blocking once per rendered frame.
///
/// The newest result at or before the current frame index wins and is reused
/// until a newer one arrives, so a detector slower than the camera keeps the
/// mask on its last known pose. Once the sending side hangs up and every
/// result has been consumed, later frames are reported untracked.
///
/// Results ahead of the current frame wait in a queue no longer than the
/// channel capacity; when it overflows the oldest waiting result is dropped.
pub struct ChannelLandmarkSource {
    receiver: Option<Receiver<LandmarkResult>>,
    pending: VecDeque<LandmarkResult>,
    max_pending: usize,
    latest: Option<LandmarkResult>,
    disconnected: bool,
}

/// Creates a bounded detector channel and the source that drains it.
pub fn landmark_channel(capacity: usize) -> (Sender<LandmarkResult>, ChannelLandmarkSource) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (tx, ChannelLandmarkSource::new(rx))
}

impl ChannelLandmarkSource {
    pub fn new(receiver: Receiver<LandmarkResult>) -> Self {
        let max_pending = receiver.capacity().unwrap_or(DEFAULT_MAX_PENDING).max(1);
        Self {
            receiver: Some(receiver),
            pending: VecDeque::new(),
            max_pending,
            latest: None,
            disconnected: false,
        }
    }

    /// Forwards JSON Lines records from `reader` (e.g. a detector process
    /// piped into stdin) into the channel on a background thread.
    ///
    /// Malformed lines are skipped with a warning; the thread ends at EOF or
    /// when the receiving side is dropped, returning the number of records sent.
    pub fn spawn_line_feed<R>(reader: R, sender: Sender<LandmarkResult>) -> JoinHandle<usize>
    where
        R: BufRead + Send + 'static,
    {
        std::thread::spawn(move || {
            let mut sent = 0;
            for (i, line) in reader.lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("Landmark feed read failed: {e}");
                        break;
                    }
                };
                match parse_record(&line) {
                    Ok(Some(result)) => {
                        if sender.send(result).is_err() {
                            break;
                        }
                        sent += 1;
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Skipping landmark record on line {}: {e}", i + 1),
                }
            }
            log::debug!("Landmark feed finished after {sent} records");
            sent
        })
    }

    fn drain(&mut self) {
        let Some(rx) = self.receiver.as_ref() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(result) => {
                    if self.pending.len() >= self.max_pending {
                        if let Some(dropped) = self.pending.pop_front() {
                            log::debug!(
                                "Dropping landmark result for frame {}; detector is too far ahead",
                                dropped.frame_index
                            );
                        }
                    }
                    self.pending.push_back(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::debug!("Landmark channel disconnected");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    fn detector_gone(&self) -> bool {
        (self.disconnected || self.receiver.is_none()) && self.pending.is_empty()
    }
}

impl LandmarkSource for ChannelLandmarkSource {
    fn observe(&mut self, frame: &Frame) -> Result<FaceObservation, Box<dyn std::error::Error>> {
        self.drain();

        while self
            .pending
            .front()
            .is_some_and(|r| r.frame_index <= frame.index())
        {
            self.latest = self.pending.pop_front();
        }

        let current_consumed = self
            .latest
            .as_ref()
            .map_or(true, |r| r.frame_index < frame.index());
        if self.detector_gone() && current_consumed {
            if self.latest.take().is_some() {
                log::warn!("Landmark detector stopped delivering; switching to untracked placement");
            }
            return Ok(FaceObservation::Untracked);
        }

        Ok(match self.latest.as_ref().and_then(|r| r.face.clone()) {
            Some(face) => FaceObservation::Face(face),
            None => FaceObservation::NoFace,
        })
    }

    fn close(&mut self) {
        self.receiver = None;
        self.pending.clear();
        self.latest = None;
    }

    fn name(&self) -> &str {
        "live"
    }
}

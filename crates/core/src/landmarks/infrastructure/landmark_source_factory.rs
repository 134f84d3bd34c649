use std::io::BufReader;
use std::path::PathBuf;

use crate::landmarks::domain::landmark_source::LandmarkSource;

use super::channel_landmark_source::{landmark_channel, ChannelLandmarkSource};
use super::fallback_landmark_source::FallbackLandmarkSource;
use super::recorded_landmark_source::RecordedLandmarkSource;

const STDIN_CHANNEL_CAPACITY: usize = 64;

/// Where detector results come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LandmarkFeed {
    /// No detector configured.
    None,
    /// JSON Lines recording replayed by frame index.
    Recorded(PathBuf),
    /// A detector process streaming JSON Lines into stdin.
    Stdin,
}

impl LandmarkFeed {
    /// `-` selects stdin, anything else is a recording path.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => LandmarkFeed::None,
            Some("-") => LandmarkFeed::Stdin,
            Some(path) => LandmarkFeed::Recorded(PathBuf::from(path)),
        }
    }
}

/// Picks the landmark source once at startup.
///
/// A detector that cannot be brought up degrades to the fallback source
/// instead of failing the session. Logs which source is selected.
pub fn create_landmark_source(feed: &LandmarkFeed) -> Box<dyn LandmarkSource> {
    match feed {
        LandmarkFeed::Recorded(path) => match RecordedLandmarkSource::load(path) {
            Ok(source) => {
                log::info!("Using recorded landmarks from {}", path.display());
                Box::new(source)
            }
            Err(e) => {
                log::warn!("Landmark detector unavailable ({e}); using untracked placement");
                Box::new(FallbackLandmarkSource)
            }
        },
        LandmarkFeed::Stdin => {
            let (tx, source) = landmark_channel(STDIN_CHANNEL_CAPACITY);
            ChannelLandmarkSource::spawn_line_feed(BufReader::new(std::io::stdin()), tx);
            log::info!("Using live landmarks streamed on stdin");
            Box::new(source)
        }
        LandmarkFeed::None => {
            log::info!("No landmark detector configured; using untracked placement");
            Box::new(FallbackLandmarkSource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_feed_from_arg() {
        assert_eq!(LandmarkFeed::from_arg(None), LandmarkFeed::None);
        assert_eq!(LandmarkFeed::from_arg(Some("-")), LandmarkFeed::Stdin);
        assert_eq!(
            LandmarkFeed::from_arg(Some("track.jsonl")),
            LandmarkFeed::Recorded(PathBuf::from("track.jsonl"))
        );
    }

    #[test]
    fn test_no_feed_uses_fallback() {
        let source = create_landmark_source(&LandmarkFeed::None);
        assert_eq!(source.name(), "fallback");
    }

    #[test]
    fn test_unreadable_recording_falls_back() {
        let feed = LandmarkFeed::Recorded(PathBuf::from("/nonexistent/track.jsonl"));
        assert_eq!(create_landmark_source(&feed).name(), "fallback");
    }

    #[test]
    fn test_valid_recording_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"frame": 0}}"#).unwrap();
        let feed = LandmarkFeed::Recorded(file.path().to_path_buf());
        assert_eq!(create_landmark_source(&feed).name(), "recorded");
    }
}

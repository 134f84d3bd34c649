pub mod channel_landmark_source;
pub mod fallback_landmark_source;
pub mod landmark_source_factory;
pub mod landmark_track;
pub mod recorded_landmark_source;

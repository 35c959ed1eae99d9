pub mod keypoint;
pub mod metrics;
pub mod recording;
pub mod source;
pub mod video;

pub use keypoint::{Keypoint, KeypointIndex, TrackId, TrackedPerson};
pub use metrics::WorkoutMetrics;
pub use recording::{KeypointRecording, RecordedFrame, RecordingBackend};
pub use source::{PoseSource, PoseSourceError};
pub use video::{Frame, FrameReader, FrameWriter, VideoBackend, VideoHeader};

use crate::pose_interface::keypoint::TrackedPerson;
use crate::pose_interface::video::Frame;

/// Per-frame pose-source failure. The pipeline skips the frame and counts it;
/// it never reaches the caller of `process_video`.
#[derive(thiserror::Error, Debug)]
pub enum PoseSourceError {
    #[error("pose inference failed: {0}")]
    Inference(String),
    #[error("inconsistent pose output: {0}")]
    Inconsistent(String),
}

/// Contract of the external keypoint detector/tracker.
///
/// Implementations are constructed once and shared read-only between
/// pipeline instances, so `track` takes `&self` and the trait requires
/// `Send + Sync`.
pub trait PoseSource: Send + Sync {
    fn track(&self, frame: &Frame) -> Result<Vec<TrackedPerson>, PoseSourceError>;
}

use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::pose_interface::source::PoseSourceError;

/// Track identifier assigned by the pose source; stable while the same
/// physical person can be re-associated across frames.
pub type TrackId = u32;

/// COCO 17-keypoint index scheme used by the pose source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        use KeypointIndex::*;
        const ALL: [KeypointIndex; KeypointIndex::COUNT] = [
            Nose,
            LeftEye,
            RightEye,
            LeftEar,
            RightEar,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
        ];
        ALL.get(index).copied()
    }

    /// Raw (proximal, joint, distal) indices as stored in a config.
    pub const fn triplet(proximal: Self, joint: Self, distal: Self) -> [usize; 3] {
        [proximal as usize, joint as usize, distal as usize]
    }
}

/// A single landmark in pixel coordinates of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Visibility confidence in [0, 1]; 0 means "not visible".
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Visible when the confidence is strictly above `min_confidence`.
    pub fn is_visible(&self, min_confidence: f32) -> bool {
        self.confidence > 0.0 && self.confidence > min_confidence
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.confidence.is_finite()
    }
}

/// One detected person in one frame, as emitted by the pose source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPerson {
    pub id: TrackId,
    pub keypoints: Vec<Keypoint>,
}

impl TrackedPerson {
    pub fn new(id: TrackId, keypoints: Vec<Keypoint>) -> Self {
        Self { id, keypoints }
    }

    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    /// Resolves a (proximal, joint, distal) triplet, `None` if any index is missing.
    pub fn triplet(&self, indices: [usize; 3]) -> Option<[Keypoint; 3]> {
        Some([
            *self.keypoint(indices[0])?,
            *self.keypoint(indices[1])?,
            *self.keypoint(indices[2])?,
        ])
    }
}

/// Builds tracked persons from a raw `(n_person, n_keypoints, 3)` tensor of
/// `(x, y, confidence)` rows, the layout most pose models emit.
pub fn persons_from_tensor(
    ids: &[TrackId],
    data: ArrayView3<f32>,
) -> Result<Vec<TrackedPerson>, PoseSourceError> {
    let (persons, points, channels) = data.dim();
    if channels != 3 {
        return Err(PoseSourceError::Inconsistent(format!(
            "expected 3 channels per keypoint, got {}",
            channels
        )));
    }
    if ids.len() != persons {
        return Err(PoseSourceError::Inconsistent(format!(
            "{} track ids for {} persons",
            ids.len(),
            persons
        )));
    }

    let mut tracked = Vec::with_capacity(persons);
    for (person, &id) in data.outer_iter().zip(ids) {
        let mut keypoints = Vec::with_capacity(points);
        for row in person.outer_iter() {
            keypoints.push(Keypoint::new(row[0], row[1], row[2]));
        }
        tracked.push(TrackedPerson::new(id, keypoints));
    }
    Ok(tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn keypoint_index_from_index() {
        assert_eq!(KeypointIndex::from_index(5), Some(KeypointIndex::LeftShoulder));
        assert_eq!(KeypointIndex::from_index(16), Some(KeypointIndex::RightAnkle));
        assert_eq!(KeypointIndex::from_index(17), None);
        assert_eq!(
            KeypointIndex::triplet(
                KeypointIndex::LeftHip,
                KeypointIndex::LeftKnee,
                KeypointIndex::LeftAnkle
            ),
            [11, 13, 15]
        );
    }

    #[test]
    fn zero_confidence_is_never_visible() {
        assert!(!Keypoint::new(1.0, 1.0, 0.0).is_visible(-1.0));
        assert!(Keypoint::new(1.0, 1.0, 0.4).is_visible(0.0));
        assert!(!Keypoint::new(1.0, 1.0, 0.4).is_visible(0.6));
    }

    #[test]
    fn triplet_rejects_short_keypoint_lists() {
        let person = TrackedPerson::new(1, vec![Keypoint::default(); 8]);
        assert!(person.triplet([5, 7, 9]).is_none());
        assert!(person.triplet([5, 6, 7]).is_some());
    }

    #[test]
    fn tensor_rows_become_keypoints() {
        let mut data = Array3::<f32>::zeros((2, KeypointIndex::COUNT, 3));
        data[[1, 7, 0]] = 320.0;
        data[[1, 7, 1]] = 200.0;
        data[[1, 7, 2]] = 0.9;

        let persons = persons_from_tensor(&[4, 9], data.view()).unwrap();
        assert_eq!(persons.len(), 2);
        assert_eq!(persons[1].id, 9);
        assert_eq!(persons[1].keypoints[7], Keypoint::new(320.0, 200.0, 0.9));
    }

    #[test]
    fn tensor_with_mismatched_ids_is_inconsistent() {
        let data = Array3::<f32>::zeros((2, KeypointIndex::COUNT, 3));
        assert!(persons_from_tensor(&[1], data.view()).is_err());
    }
}

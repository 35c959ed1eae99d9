use serde::{Deserialize, Serialize};

use crate::pose_interface::keypoint::KeypointIndex;
use crate::processing::exercise::ExerciseKind;

/// Configuration bundle for one `process_video` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub exercise: ExerciseKind,
    /// Athlete body mass, used for the per-kilogram figures.
    pub body_mass_kg: f64,
    /// Resisted mass moved through `displacement_m` on every rep.
    pub exercise_mass_kg: f64,
    pub up_angle_deg: f32,
    pub down_angle_deg: f32,
    pub displacement_m: f64,
    /// (proximal, joint, distal) keypoint indices of the angle-bearing joint.
    pub keypoints: [usize; 3],
    #[serde(default)]
    pub display: bool,
    /// Overrides the exercise's default for computing per-rep power.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_power: Option<bool>,
    /// Keypoints at or below this confidence are treated as not visible.
    #[serde(default)]
    pub min_confidence: f32,
}

impl ExerciseConfig {
    /// Default thresholds, joint and displacement for each exercise.
    pub fn preset(exercise: ExerciseKind, body_mass_kg: f64, exercise_mass_kg: f64) -> Self {
        use KeypointIndex::*;
        let (joint, up_angle_deg, down_angle_deg, displacement_m) = match exercise {
            ExerciseKind::PullUps => ((LeftShoulder, LeftElbow, LeftWrist), 120.0, 145.0, 0.6),
            ExerciseKind::PushUps => ((RightShoulder, RightElbow, RightWrist), 145.0, 90.0, 0.3),
            ExerciseKind::Dips => ((RightShoulder, RightElbow, RightWrist), 145.0, 90.0, 0.4),
            ExerciseKind::Squats => ((LeftHip, LeftKnee, LeftAnkle), 160.0, 100.0, 0.5),
            ExerciseKind::SitUps => ((LeftShoulder, LeftHip, LeftKnee), 130.0, 70.0, 0.4),
        };
        let keypoints = KeypointIndex::triplet(joint.0, joint.1, joint.2);
        Self {
            exercise,
            body_mass_kg,
            exercise_mass_kg,
            up_angle_deg,
            down_angle_deg,
            displacement_m,
            keypoints,
            display: false,
            supports_power: None,
            min_confidence: 0.0,
        }
    }

    pub fn power_enabled(&self) -> bool {
        self.supports_power
            .unwrap_or_else(|| self.exercise.supports_power())
    }

    /// Rejects bundles that would make the frame loop meaningless.
    pub fn validate(&self) -> ProcessingResult<()> {
        if !(self.body_mass_kg.is_finite() && self.body_mass_kg > 0.0) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "body mass must be positive, got {}",
                self.body_mass_kg
            )));
        }
        if !(self.exercise_mass_kg.is_finite() && self.exercise_mass_kg > 0.0) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "exercise mass must be positive, got {}",
                self.exercise_mass_kg
            )));
        }
        if !(self.displacement_m.is_finite() && self.displacement_m > 0.0) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "displacement must be positive, got {}",
                self.displacement_m
            )));
        }
        for (name, angle) in [("up", self.up_angle_deg), ("down", self.down_angle_deg)] {
            if !(angle.is_finite() && (0.0..=180.0).contains(&angle)) {
                return Err(ProcessingError::InvalidConfiguration(format!(
                    "{} angle must lie in [0, 180], got {}",
                    name, angle
                )));
            }
        }
        let [a, b, c] = self.keypoints;
        if let Some(&bad) = self
            .keypoints
            .iter()
            .find(|&&i| KeypointIndex::from_index(i).is_none())
        {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "keypoint index {} outside the {}-point scheme",
                bad,
                KeypointIndex::COUNT
            )));
        }
        if a == b || b == c || a == c {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "keypoint triplet {:?} repeats an index",
                self.keypoints
            )));
        }
        Ok(())
    }
}

/// Typed failures surfaced by `process_video`.
#[derive(thiserror::Error, Debug)]
pub enum ProcessingError {
    #[error("cannot open video stream {path}: {reason}")]
    StreamOpen { path: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("annotated output failed: {0}")]
    Output(String),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

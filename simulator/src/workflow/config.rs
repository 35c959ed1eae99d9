use anyhow::Context;
use gymcore::processing::{ExerciseKind, PixelBox};
use gymcore::ExerciseConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Driver settings: the exercise preset plus optional per-run overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub exercise: ExerciseKind,
    pub body_mass_kg: f64,
    pub exercise_mass_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_angle_deg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_angle_deg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<[usize; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_power: Option<bool>,
    #[serde(default)]
    pub min_confidence: f32,
    #[serde(default)]
    pub display: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Region the subject should stand in; checked against the first frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing_box: Option<PixelBox>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        exercise: ExerciseKind,
        body_mass_kg: f64,
        exercise_mass_kg: f64,
        output_dir: PathBuf,
        display: bool,
    ) -> Self {
        Self {
            exercise,
            body_mass_kg,
            exercise_mass_kg,
            up_angle_deg: None,
            down_angle_deg: None,
            displacement_m: None,
            keypoints: None,
            supports_power: None,
            min_confidence: 0.0,
            display,
            output_dir,
            framing_box: None,
        }
    }

    pub fn to_exercise_config(&self) -> ExerciseConfig {
        let mut config =
            ExerciseConfig::preset(self.exercise, self.body_mass_kg, self.exercise_mass_kg);
        if let Some(up) = self.up_angle_deg {
            config.up_angle_deg = up;
        }
        if let Some(down) = self.down_angle_deg {
            config.down_angle_deg = down;
        }
        if let Some(displacement) = self.displacement_m {
            config.displacement_m = displacement;
        }
        if let Some(keypoints) = self.keypoints {
            config.keypoints = keypoints;
        }
        config.supports_power = self.supports_power;
        config.min_confidence = self.min_confidence;
        config.display = self.display;
        config
    }
}

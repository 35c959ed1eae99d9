use anyhow::{bail, Context};
use gymcore::pose_interface::{
    Keypoint, KeypointIndex, KeypointRecording, TrackedPerson, VideoHeader,
};
use gymcore::processing::ExerciseKind;
use gymcore::ExerciseConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generator::template::rep_waveform;

const SEGMENT_PX: f32 = 60.0;

/// Configuration for synthesising a keypoint recording of a workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub exercise: ExerciseKind,
    pub reps: usize,
    pub tracks: usize,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Frames per repetition cycle.
    pub rep_frames: usize,
    /// Frames held at full extension before each rep and at the end.
    pub rest_frames: usize,
    pub jitter_deg: f32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::PullUps,
            reps: 5,
            tracks: 1,
            fps: 30.0,
            width: 1280,
            height: 720,
            rep_frames: 60,
            rest_frames: 15,
            jitter_deg: 2.0,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Angles comfortably beyond both thresholds of the exercise preset.
    fn angle_range(&self) -> (f32, f32) {
        let preset = ExerciseConfig::preset(self.exercise, 70.0, 70.0);
        let high = preset.up_angle_deg.max(preset.down_angle_deg);
        let low = preset.up_angle_deg.min(preset.down_angle_deg);
        ((high + 20.0).min(178.0), (low - 25.0).max(5.0))
    }

    fn keypoint_triplet(&self) -> [usize; 3] {
        ExerciseConfig::preset(self.exercise, 70.0, 70.0).keypoints
    }
}

fn build_angle_track(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<f32> {
    let (extended, flexed) = config.angle_range();
    let mut angles = Vec::new();
    for _ in 0..config.reps {
        angles.extend(std::iter::repeat(extended).take(config.rest_frames));
        angles.extend(rep_waveform(config.rep_frames, extended, flexed));
    }
    angles.extend(std::iter::repeat(extended).take(config.rest_frames.max(1)));

    if config.jitter_deg > 0.0 {
        for angle in angles.iter_mut() {
            *angle += rng.gen_range(-config.jitter_deg..config.jitter_deg);
        }
    }
    angles.iter().map(|a| a.clamp(1.0, 179.0)).collect()
}

/// Lays out a full keypoint set whose configured joint shows `angle`.
fn pose_with_angle(angle: f32, joint: (f32, f32), triplet: [usize; 3]) -> Vec<Keypoint> {
    let filler = Keypoint::new(joint.0, joint.1 + SEGMENT_PX * 2.0, 0.5);
    let mut keypoints = vec![filler; KeypointIndex::COUNT];
    let proximal_dir = -90.0_f32.to_radians();
    let distal_dir = proximal_dir + angle.to_radians();

    keypoints[triplet[0]] = Keypoint::new(
        joint.0 + SEGMENT_PX * proximal_dir.cos(),
        joint.1 + SEGMENT_PX * proximal_dir.sin(),
        0.95,
    );
    keypoints[triplet[1]] = Keypoint::new(joint.0, joint.1, 0.95);
    keypoints[triplet[2]] = Keypoint::new(
        joint.0 + SEGMENT_PX * distal_dir.cos(),
        joint.1 + SEGMENT_PX * distal_dir.sin(),
        0.95,
    );
    keypoints
}

pub fn build_recording(config: &GeneratorConfig) -> anyhow::Result<KeypointRecording> {
    if !(config.fps.is_finite() && config.fps > 0.0) {
        bail!("generator fps must be positive, got {}", config.fps);
    }
    if config.rep_frames < 4 {
        bail!("rep_frames must be at least 4, got {}", config.rep_frames);
    }
    let per_rep = config
        .rep_frames
        .checked_add(config.rest_frames)
        .context("overflow computing frames per rep")?;
    per_rep
        .checked_mul(config.reps)
        .context("overflow computing recording length")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let triplet = config.keypoint_triplet();
    let track_count = config.tracks.max(1);
    let angle_tracks: Vec<Vec<f32>> = (0..track_count)
        .map(|_| build_angle_track(config, &mut rng))
        .collect();

    let mut recording = KeypointRecording::new(VideoHeader {
        width: config.width,
        height: config.height,
        fps: config.fps,
    });
    let frame_count = angle_tracks.iter().map(Vec::len).max().unwrap_or(0);
    for frame in 0..frame_count {
        let persons = angle_tracks
            .iter()
            .enumerate()
            .filter_map(|(slot, angles)| {
                let angle = *angles.get(frame)?;
                let joint = (
                    config.width as f32 * (slot + 1) as f32 / (track_count + 1) as f32,
                    config.height as f32 / 2.0,
                );
                Some(TrackedPerson::new(
                    slot as u32 + 1,
                    pose_with_angle(angle, joint, triplet),
                ))
            })
            .collect();
        recording.push_frame(persons);
    }
    Ok(recording)
}

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::math::angle::NO_ANGLE;
use crate::pose_interface::keypoint::Keypoint;
use crate::prelude::{ExerciseConfig, ProcessingError};
use crate::processing::power::PowerModel;
use crate::processing::tracks::TrackState;

/// Supported exercise types. Dips, squats and sit-ups are recognised but
/// never count reps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExerciseKind {
    PullUps,
    PushUps,
    Dips,
    Squats,
    SitUps,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::PullUps,
        ExerciseKind::PushUps,
        ExerciseKind::Dips,
        ExerciseKind::Squats,
        ExerciseKind::SitUps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::PullUps => "pullups",
            ExerciseKind::PushUps => "pushups",
            ExerciseKind::Dips => "dips",
            ExerciseKind::Squats => "squats",
            ExerciseKind::SitUps => "situps",
        }
    }

    /// Whether completed reps carry a vertical-displacement power estimate
    /// unless the configuration says otherwise.
    pub fn supports_power(&self) -> bool {
        matches!(self, ExerciseKind::PullUps)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| {
                let name = kind.as_str();
                name == normalized || name.trim_end_matches('s') == normalized
            })
            .ok_or_else(|| {
                ProcessingError::InvalidConfiguration(format!("unrecognized exercise type '{}'", s))
            })
    }
}

impl TryFrom<String> for ExerciseKind {
    type Error = ProcessingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Phase of a repetition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Undetermined,
    Up,
    Down,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Undetermined => "-",
            Stage::Up => "up",
            Stage::Down => "down",
        })
    }
}

/// Emitted when a track closes a full repetition cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepEvent {
    pub frame_index: u64,
    pub duration_s: f64,
    pub power_w: f64,
}

/// Exercise-specific stage machine shared by every track of one video.
#[derive(Debug, Clone)]
pub struct ExerciseMachine {
    kind: ExerciseKind,
    up_angle: f32,
    down_angle: f32,
    fps: f64,
    power: PowerModel,
    power_enabled: bool,
}

impl ExerciseMachine {
    pub fn new(config: &ExerciseConfig, fps: f64) -> Self {
        Self {
            kind: config.exercise,
            up_angle: config.up_angle_deg,
            down_angle: config.down_angle_deg,
            fps,
            power: PowerModel::new(config.exercise_mass_kg, config.displacement_m),
            power_enabled: config.power_enabled(),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn power_model(&self) -> &PowerModel {
        &self.power
    }

    /// Applies one frame's joint angle to `state`. `triplet[0]` is the
    /// proximal landmark whose y is recorded at rep start.
    pub fn step(
        &self,
        state: &mut TrackState,
        angle: f32,
        triplet: &[Keypoint; 3],
        frame_index: u64,
    ) -> Option<RepEvent> {
        state.observe_angle(angle);
        if angle == NO_ANGLE {
            return None;
        }
        let anchor_y = triplet[0].y;

        match self.kind {
            ExerciseKind::PullUps => self.step_pullup(state, angle, anchor_y, frame_index),
            ExerciseKind::PushUps => self.step_pushup(state, angle, anchor_y, frame_index),
            ExerciseKind::Dips | ExerciseKind::Squats | ExerciseKind::SitUps => None,
        }
    }

    fn step_pullup(
        &self,
        state: &mut TrackState,
        angle: f32,
        anchor_y: f32,
        frame_index: u64,
    ) -> Option<RepEvent> {
        if angle > self.down_angle && state.stage() != Stage::Down {
            state.mark_rep_start(frame_index, anchor_y);
            state.set_stage(Stage::Down);
            None
        } else if angle < self.up_angle {
            let event = if state.stage() == Stage::Down {
                self.close_rep(state, frame_index)
            } else {
                None
            };
            state.set_stage(Stage::Up);
            event
        } else {
            None
        }
    }

    fn step_pushup(
        &self,
        state: &mut TrackState,
        angle: f32,
        anchor_y: f32,
        frame_index: u64,
    ) -> Option<RepEvent> {
        if angle < self.down_angle {
            let event = if state.stage() == Stage::Up {
                self.close_rep(state, frame_index)
            } else {
                None
            };
            state.set_stage(Stage::Down);
            event
        } else if angle > self.up_angle {
            if state.stage() != Stage::Up {
                state.mark_rep_start(frame_index, anchor_y);
            }
            state.set_stage(Stage::Up);
            None
        } else {
            None
        }
    }

    /// Records the rep unless the anchor is missing or the duration is not
    /// positive, in which case no event is emitted at all.
    fn close_rep(&self, state: &mut TrackState, frame_index: u64) -> Option<RepEvent> {
        let anchor = state.rep_start_frame()?;
        let elapsed = frame_index.checked_sub(anchor)?;
        let duration_s = elapsed as f64 / self.fps;
        if !(duration_s > 0.0) || !duration_s.is_finite() {
            return None;
        }

        let power_w = if self.power_enabled {
            self.power.rep_power(duration_s)
        } else {
            0.0
        };
        state.complete_rep(duration_s, power_w);
        debug!(
            "track {} rep {} closed at frame {}: {:.2}s {:.1}W",
            state.track_id(),
            state.rep_count(),
            frame_index,
            duration_s,
            power_w
        );
        Some(RepEvent {
            frame_index,
            duration_s,
            power_w,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: f64 = 30.0;

    fn triplet() -> [Keypoint; 3] {
        [
            Keypoint::new(100.0, 200.0, 0.9),
            Keypoint::new(120.0, 260.0, 0.9),
            Keypoint::new(140.0, 320.0, 0.9),
        ]
    }

    fn machine(kind: ExerciseKind, up: f32, down: f32) -> ExerciseMachine {
        let mut config = ExerciseConfig::preset(kind, 70.0, 70.0);
        config.up_angle_deg = up;
        config.down_angle_deg = down;
        config.displacement_m = 0.6;
        ExerciseMachine::new(&config, FPS)
    }

    fn run(machine: &ExerciseMachine, state: &mut TrackState, angles: &[f32]) -> Vec<RepEvent> {
        angles
            .iter()
            .enumerate()
            .filter_map(|(frame, &angle)| machine.step(state, angle, &triplet(), frame as u64))
            .collect()
    }

    #[test]
    fn pullup_cycle_counts_one_rep_with_frame_timing() {
        let machine = machine(ExerciseKind::PullUps, 30.0, 145.0);
        let mut state = TrackState::new(1);
        let events = run(&machine, &mut state, &[150.0, 150.0, 100.0, 100.0, 29.0, 29.0]);

        assert_eq!(state.rep_count(), 1);
        assert_eq!(events.len(), 1);
        // First >145 at frame 0, first <30 at frame 4.
        assert!((state.rep_durations()[0] - 4.0 / FPS).abs() < 1e-12);
        let expected_power = 70.0 * 9.81 * 0.6 / (4.0 / FPS);
        assert!((state.rep_powers()[0] - expected_power).abs() < 1e-6);
        assert_eq!(state.stage(), Stage::Up);
    }

    #[test]
    fn pullup_threshold_equality_does_not_transition() {
        let machine = machine(ExerciseKind::PullUps, 30.0, 145.0);
        let mut state = TrackState::new(1);
        run(&machine, &mut state, &[145.0, 30.0]);
        assert_eq!(state.stage(), Stage::Undetermined);

        run(&machine, &mut state, &[150.0, 30.0, 30.0]);
        assert_eq!(state.stage(), Stage::Down);
        assert_eq!(state.rep_count(), 0);
    }

    #[test]
    fn pullup_anchor_at_frame_zero_produces_real_duration() {
        let machine = machine(ExerciseKind::PullUps, 120.0, 145.0);
        let mut state = TrackState::new(1);
        let events = run(&machine, &mut state, &[160.0, 90.0]);
        assert_eq!(events.len(), 1);
        assert!((events[0].duration_s - 1.0 / FPS).abs() < 1e-12);
        assert!(events[0].power_w > 0.0);
    }

    #[test]
    fn pullup_starting_at_top_needs_a_full_hang_first() {
        let machine = machine(ExerciseKind::PullUps, 120.0, 145.0);
        let mut state = TrackState::new(1);
        run(&machine, &mut state, &[90.0, 90.0, 130.0, 90.0]);
        assert_eq!(state.rep_count(), 0);
        assert_eq!(state.stage(), Stage::Up);
    }

    #[test]
    fn sentinel_angle_never_transitions() {
        let machine = machine(ExerciseKind::PullUps, 120.0, 145.0);
        let mut state = TrackState::new(1);
        run(&machine, &mut state, &[160.0, NO_ANGLE, NO_ANGLE]);
        assert_eq!(state.stage(), Stage::Down);
        assert_eq!(state.rep_count(), 0);
        assert_eq!(state.current_angle(), NO_ANGLE);
    }

    #[test]
    fn pushup_counts_each_full_cycle_once() {
        let machine = machine(ExerciseKind::PushUps, 145.0, 90.0);
        let mut state = TrackState::new(1);
        let angles = [
            160.0, 160.0, 120.0, 80.0, 80.0, 120.0, 160.0, 120.0, 70.0, 100.0, 150.0,
        ];
        let events = run(&machine, &mut state, &angles);

        assert_eq!(state.rep_count(), 2);
        assert_eq!(events.len(), 2);
        assert_eq!(state.rep_durations().len(), 2);
        // Up entered at frame 0, down crossed at frame 3.
        assert!((state.rep_durations()[0] - 3.0 / FPS).abs() < 1e-12);
        assert_eq!(state.rep_powers(), &[0.0, 0.0]);
        assert_eq!(state.stage(), Stage::Up);
    }

    #[test]
    fn pushup_partial_cycle_counts_nothing() {
        let machine = machine(ExerciseKind::PushUps, 145.0, 90.0);
        let mut state = TrackState::new(1);
        run(&machine, &mut state, &[120.0, 80.0, 70.0, 100.0]);
        assert_eq!(state.rep_count(), 0);
        assert_eq!(state.stage(), Stage::Down);
    }

    #[test]
    fn pushup_power_can_be_enabled() {
        let mut config = ExerciseConfig::preset(ExerciseKind::PushUps, 70.0, 50.0);
        config.supports_power = Some(true);
        let machine = ExerciseMachine::new(&config, FPS);
        let mut state = TrackState::new(1);
        run(&machine, &mut state, &[160.0, 120.0, 80.0]);
        let expected = 50.0 * 9.81 * 0.3 / (2.0 / FPS);
        assert!((state.rep_powers()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn placeholder_exercises_never_emit() {
        for kind in [ExerciseKind::Dips, ExerciseKind::Squats, ExerciseKind::SitUps] {
            let machine = machine(kind, 120.0, 145.0);
            let mut state = TrackState::new(1);
            let events = run(&machine, &mut state, &[170.0, 20.0, 170.0, 20.0]);
            assert!(events.is_empty());
            assert_eq!(state.stage(), Stage::Undetermined);
            assert_eq!(state.current_angle(), 20.0);
        }
    }

    #[test]
    fn exercise_names_parse_leniently() {
        assert_eq!("pullups".parse::<ExerciseKind>().unwrap(), ExerciseKind::PullUps);
        assert_eq!("Pull-Ups".parse::<ExerciseKind>().unwrap(), ExerciseKind::PullUps);
        assert_eq!("pushup".parse::<ExerciseKind>().unwrap(), ExerciseKind::PushUps);
        assert_eq!("sit_ups".parse::<ExerciseKind>().unwrap(), ExerciseKind::SitUps);
        assert!(matches!(
            "burpees".parse::<ExerciseKind>(),
            Err(ProcessingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn deserialization_accepts_the_same_names_as_parsing() {
        let kind: ExerciseKind = serde_json::from_str("\"pull-ups\"").unwrap();
        assert_eq!(kind, ExerciseKind::PullUps);
        let kind: ExerciseKind = serde_json::from_str("\"Sit_Ups\"").unwrap();
        assert_eq!(kind, ExerciseKind::SitUps);
        assert!(serde_json::from_str::<ExerciseKind>("\"burpees\"").is_err());
        assert_eq!(
            serde_json::to_string(&ExerciseKind::PushUps).unwrap(),
            "\"pushups\""
        );
    }
}

use std::collections::HashMap;

use crate::pose_interface::keypoint::TrackId;
use crate::processing::exercise::Stage;
use crate::processing::power::PowerSummary;

/// Repetition state of one tracked person for the duration of a video.
///
/// The stage and rep histories are only mutated by the exercise machine;
/// `complete_rep` appends a duration and a power together and bumps the
/// count, so both histories always have `rep_count` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    track_id: TrackId,
    current_angle: f32,
    stage: Stage,
    rep_count: u32,
    rep_start_frame: Option<u64>,
    rep_start_position: Option<f32>,
    rep_durations: Vec<f64>,
    rep_powers: Vec<f64>,
}

impl TrackState {
    pub fn new(track_id: TrackId) -> Self {
        Self {
            track_id,
            current_angle: 0.0,
            stage: Stage::Undetermined,
            rep_count: 0,
            rep_start_frame: None,
            rep_start_position: None,
            rep_durations: Vec::new(),
            rep_powers: Vec::new(),
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn rep_start_frame(&self) -> Option<u64> {
        self.rep_start_frame
    }

    pub fn rep_start_position(&self) -> Option<f32> {
        self.rep_start_position
    }

    pub fn rep_durations(&self) -> &[f64] {
        &self.rep_durations
    }

    pub fn rep_powers(&self) -> &[f64] {
        &self.rep_powers
    }

    pub fn power_summary(&self) -> PowerSummary {
        PowerSummary::from_powers(&self.rep_powers)
    }

    pub fn avg_power(&self) -> f64 {
        self.power_summary().avg_power
    }

    pub fn max_power(&self) -> f64 {
        self.power_summary().max_power
    }

    pub(crate) fn observe_angle(&mut self, angle: f32) {
        self.current_angle = angle;
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn mark_rep_start(&mut self, frame_index: u64, position_y: f32) {
        self.rep_start_frame = Some(frame_index);
        self.rep_start_position = Some(position_y);
    }

    pub(crate) fn complete_rep(&mut self, duration_s: f64, power_w: f64) {
        self.rep_durations.push(duration_s);
        self.rep_powers.push(power_w);
        self.rep_count += 1;
        self.rep_start_frame = None;
    }
}

/// Per-track state keyed by pose-source track id.
///
/// States live in an arena in first-sighting order; the map only resolves
/// ids to arena slots. Nothing is evicted during a processing call.
#[derive(Debug, Default)]
pub struct TrackStore {
    index: HashMap<TrackId, usize>,
    tracks: Vec<TrackState>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `id`, created fresh on first sighting.
    pub fn get_or_insert(&mut self, id: TrackId) -> &mut TrackState {
        let slot = match self.index.get(&id) {
            Some(&slot) => slot,
            None => {
                self.tracks.push(TrackState::new(id));
                let slot = self.tracks.len() - 1;
                self.index.insert(id, slot);
                slot
            }
        };
        &mut self.tracks[slot]
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackState> {
        self.index.get(&id).map(|&slot| &self.tracks[slot])
    }

    /// The earliest-sighted track, used as the subject of the final metrics.
    pub fn first(&self) -> Option<&TrackState> {
        self.tracks.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackState> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pose_interface::keypoint::{Keypoint, TrackId};
use crate::pose_interface::video::{FrameWriter, VideoHeader};
use crate::prelude::{ProcessingError, ProcessingResult};
use crate::processing::exercise::Stage;
use crate::processing::power::PowerModel;
use crate::processing::tracks::TrackState;

/// Overlay drawn for one tracked person in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnnotation {
    pub track_id: TrackId,
    pub angle: f32,
    pub stage: Stage,
    pub rep_count: u32,
    /// The angle-bearing keypoint triplet, as drawn.
    pub keypoints: Vec<Keypoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlay: Vec<String>,
}

impl TrackAnnotation {
    /// Single-line rendering of the per-frame overlay: joint angle and stage
    /// always, followed by the rep lines once any exist.
    pub fn display_line(&self) -> String {
        let mut line = format!(
            "track {}: angle {:.1} stage {} reps {}",
            self.track_id, self.angle, self.stage, self.rep_count
        );
        for entry in &self.overlay {
            line.push_str(" | ");
            line.push_str(entry);
        }
        line
    }
}

/// One output frame: the input frame's index plus its overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFrame {
    pub frame_index: u64,
    pub width: u32,
    pub height: u32,
    /// Set when the pose source failed for this frame.
    #[serde(default)]
    pub skipped: bool,
    pub tracks: Vec<TrackAnnotation>,
}

/// Text lines shown at the bottom left for a track with completed reps.
pub fn overlay_lines(state: &TrackState, power: &PowerModel, power_enabled: bool) -> Vec<String> {
    if state.rep_count() == 0 {
        return Vec::new();
    }

    let mut lines = vec![format!("Reps: {}", state.rep_count())];
    if power_enabled {
        lines.push(format!("m: {:.0} kg", power.mass_kg()));
        lines.push(format!("dh: {:.2} m", power.displacement_m()));
    }
    if let Some(duration) = state.rep_durations().last() {
        lines.push(format!("t: {:.2} s", duration));
    }
    if power_enabled {
        if let Some(watts) = state.rep_powers().last() {
            lines.push(format!("Rep Power: {:.0} W", watts));
        }
        let summary = state.power_summary();
        if summary.max_power > 0.0 {
            lines.push(format!("Max Power: {:.0} W", summary.max_power));
        }
        if summary.avg_power > 0.0 {
            lines.push(format!("Avg Power: {:.0} W", summary.avg_power));
        }
    }
    lines
}

/// Writes annotated frames as JSON lines, one object per frame.
pub struct JsonLinesWriter {
    path: PathBuf,
    out: Option<BufWriter<File>>,
}

impl JsonLinesWriter {
    pub fn create(path: &Path, _header: &VideoHeader) -> ProcessingResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                ProcessingError::Output(format!("creating {}: {}", parent.display(), err))
            })?;
        }
        let file = File::create(path).map_err(|err| {
            ProcessingError::Output(format!("creating {}: {}", path.display(), err))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            out: Some(BufWriter::new(file)),
        })
    }
}

impl FrameWriter for JsonLinesWriter {
    fn write(&mut self, frame: &AnnotatedFrame) -> ProcessingResult<()> {
        let out = self.out.as_mut().ok_or_else(|| {
            ProcessingError::Output(format!("{} already finished", self.path.display()))
        })?;
        serde_json::to_writer(&mut *out, frame)
            .map_err(|err| ProcessingError::Output(err.to_string()))?;
        out.write_all(b"\n")
            .map_err(|err| ProcessingError::Output(err.to_string()))
    }

    fn finish(&mut self) -> ProcessingResult<PathBuf> {
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|err| {
                ProcessingError::Output(format!("flushing {}: {}", self.path.display(), err))
            })?;
        }
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn overlay_is_empty_before_first_rep() {
        let state = TrackState::new(1);
        assert!(overlay_lines(&state, &PowerModel::new(70.0, 0.6), true).is_empty());
    }

    #[test]
    fn display_line_covers_frames_before_first_rep() {
        let mut annotation = TrackAnnotation {
            track_id: 3,
            angle: 151.25,
            stage: Stage::Down,
            rep_count: 0,
            keypoints: vec![Keypoint::default(); 3],
            overlay: Vec::new(),
        };
        assert_eq!(annotation.display_line(), "track 3: angle 151.2 stage down reps 0");

        annotation.rep_count = 1;
        annotation.overlay = vec!["Reps: 1".to_string(), "t: 1.00 s".to_string()];
        assert_eq!(
            annotation.display_line(),
            "track 3: angle 151.2 stage down reps 1 | Reps: 1 | t: 1.00 s"
        );
    }

    #[test]
    fn overlay_lists_power_lines() {
        let mut state = TrackState::new(1);
        state.complete_rep(2.0, 206.01);
        let lines = overlay_lines(&state, &PowerModel::new(70.0, 0.6), true);
        assert_eq!(
            lines,
            vec![
                "Reps: 1",
                "m: 70 kg",
                "dh: 0.60 m",
                "t: 2.00 s",
                "Rep Power: 206 W",
                "Max Power: 206 W",
                "Avg Power: 206 W",
            ]
        );
    }

    #[test]
    fn overlay_without_power_shows_count_and_time() {
        let mut state = TrackState::new(1);
        state.complete_rep(1.5, 0.0);
        let lines = overlay_lines(&state, &PowerModel::new(70.0, 0.3), false);
        assert_eq!(lines, vec!["Reps: 1", "t: 1.50 s"]);
    }

    #[test]
    fn writer_emits_one_line_per_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");
        let header = VideoHeader {
            width: 640,
            height: 480,
            fps: 30.0,
        };
        let mut writer = JsonLinesWriter::create(&path, &header).unwrap();
        for index in 0..3 {
            writer
                .write(&AnnotatedFrame {
                    frame_index: index,
                    width: 640,
                    height: 480,
                    skipped: false,
                    tracks: Vec::new(),
                })
                .unwrap();
        }
        assert_eq!(writer.finish().unwrap(), path);
        assert!(writer
            .write(&AnnotatedFrame {
                frame_index: 3,
                width: 640,
                height: 480,
                skipped: false,
                tracks: Vec::new(),
            })
            .is_err());

        let contents = fs::read_to_string(&path).unwrap();
        let frames: Vec<AnnotatedFrame> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].frame_index, 2);
    }
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::math::angle::keypoint_angle;
use crate::pose_interface::keypoint::TrackedPerson;
use crate::pose_interface::metrics::WorkoutMetrics;
use crate::pose_interface::source::{PoseSource, PoseSourceError};
use crate::pose_interface::video::{
    Frame, FrameReader, FrameWriter, VideoBackend, VideoHeader,
};
use crate::prelude::{ExerciseConfig, ProcessingError, ProcessingResult};
use crate::processing::annotate::{overlay_lines, AnnotatedFrame, TrackAnnotation};
use crate::processing::exercise::ExerciseMachine;
use crate::processing::tracks::TrackStore;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{CounterSnapshot, PipelineCounters};

/// Cooperative stop signal checked before every frame read. A cancelled
/// run reduces whatever histories exist instead of failing.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Metrics plus the bookkeeping gathered while producing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub metrics: WorkoutMetrics,
    pub counters: CounterSnapshot,
    pub tracks_seen: usize,
    pub cancelled: bool,
}

/// Entry point used by upload handlers and background jobs alike.
///
/// The pose source and video backend are built once and shared; every call
/// gets its own track store, so concurrent calls never share mutable state.
#[derive(Clone)]
pub struct WorkoutProcessor {
    pose: Arc<dyn PoseSource>,
    video: Arc<dyn VideoBackend>,
    output_dir: PathBuf,
}

impl WorkoutProcessor {
    pub fn new(
        pose: Arc<dyn PoseSource>,
        video: Arc<dyn VideoBackend>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pose,
            video,
            output_dir: output_dir.into(),
        }
    }

    pub fn process_video<P: AsRef<Path>>(
        &self,
        path: P,
        config: &ExerciseConfig,
    ) -> ProcessingResult<WorkoutMetrics> {
        self.process_video_with_report(path, config, &CancellationFlag::new())
            .map(|report| report.metrics)
    }

    pub fn process_video_with_report<P: AsRef<Path>>(
        &self,
        path: P,
        config: &ExerciseConfig,
        cancel: &CancellationFlag,
    ) -> ProcessingResult<ProcessingReport> {
        config.validate()?;
        let path = path.as_ref();
        let logger = LogManager::new(path.display().to_string());

        let mut reader = self.video.open(path)?;
        let header = reader.header();
        if !(header.fps.is_finite() && header.fps > 0.0) {
            return Err(ProcessingError::StreamOpen {
                path: path.display().to_string(),
                reason: format!("invalid frame rate {}", header.fps),
            });
        }
        logger.record(&format!(
            "opened {}x{} @ {:.2} fps for {}",
            header.width, header.height, header.fps, config.exercise
        ));

        let output_path = self.reserve_output_path(path)?;
        let mut writer = self.video.create_writer(&output_path, &header)?;

        let mut session = Session::new(config, header, &logger);
        let outcome = session.run(reader.as_mut(), writer.as_mut(), self.pose.as_ref(), cancel);
        let finished = writer.finish();
        drop(reader);

        let cancelled = outcome?;
        let artifact = finished?;
        Ok(session.reduce(artifact, cancelled))
    }

    /// Claims a fresh `<stem>_<random>_annotated.jsonl` in the output
    /// directory, so calls on same-named inputs never share an artifact.
    fn reserve_output_path(&self, input: &Path) -> ProcessingResult<PathBuf> {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workout".to_string());
        fs::create_dir_all(&self.output_dir).map_err(|err| {
            ProcessingError::Output(format!(
                "creating {}: {}",
                self.output_dir.display(),
                err
            ))
        })?;
        let reserved = tempfile::Builder::new()
            .prefix(&format!("{}_", stem))
            .suffix("_annotated.jsonl")
            .tempfile_in(&self.output_dir)
            .map_err(|err| {
                ProcessingError::Output(format!(
                    "reserving artifact in {}: {}",
                    self.output_dir.display(),
                    err
                ))
            })?;
        reserved
            .into_temp_path()
            .keep()
            .map_err(|err| ProcessingError::Output(format!("keeping artifact: {}", err)))
    }
}

/// Mutable state of one processing call.
struct Session<'a> {
    config: &'a ExerciseConfig,
    header: VideoHeader,
    machine: ExerciseMachine,
    tracks: TrackStore,
    counters: PipelineCounters,
    logger: &'a LogManager,
}

impl<'a> Session<'a> {
    fn new(config: &'a ExerciseConfig, header: VideoHeader, logger: &'a LogManager) -> Self {
        Self {
            config,
            header,
            machine: ExerciseMachine::new(config, header.fps),
            tracks: TrackStore::new(),
            counters: PipelineCounters::new(),
            logger,
        }
    }

    /// Reads frames in stream order until exhaustion or cancellation.
    /// Returns whether the run was cancelled.
    fn run(
        &mut self,
        reader: &mut dyn FrameReader,
        writer: &mut dyn FrameWriter,
        pose: &dyn PoseSource,
        cancel: &CancellationFlag,
    ) -> ProcessingResult<bool> {
        loop {
            if cancel.is_cancelled() {
                self.logger.record(&format!(
                    "cancelled after {} frames",
                    self.counters.snapshot().frames_processed
                ));
                return Ok(true);
            }
            let Some(frame) = reader.next_frame() else {
                return Ok(false);
            };
            let annotated = self.process_frame(&frame, pose);
            writer.write(&annotated)?;
        }
    }

    fn process_frame(&mut self, frame: &Frame, pose: &dyn PoseSource) -> AnnotatedFrame {
        self.counters.record_processed();
        let mut annotated = AnnotatedFrame {
            frame_index: frame.index,
            width: self.header.width,
            height: self.header.height,
            skipped: false,
            tracks: Vec::new(),
        };

        let persons = match pose
            .track(frame)
            .and_then(|persons| check_consistency(persons, self.config.keypoints))
        {
            Ok(persons) => persons,
            Err(err) => {
                self.counters.record_skipped();
                self.logger
                    .warn(&format!("skipping frame {}: {}", frame.index, err));
                annotated.skipped = true;
                return annotated;
            }
        };

        for person in &persons {
            // Presence of the triplet was checked for every person above.
            let Some(triplet) = person.triplet(self.config.keypoints) else {
                continue;
            };
            let angle = keypoint_angle(&triplet, self.config.min_confidence);
            let state = self.tracks.get_or_insert(person.id);
            if self.machine.step(state, angle, &triplet, frame.index).is_some() {
                self.counters.record_rep();
            }

            let overlay = overlay_lines(
                state,
                self.machine.power_model(),
                self.config.power_enabled(),
            );
            let annotation = TrackAnnotation {
                track_id: person.id,
                angle,
                stage: state.stage(),
                rep_count: state.rep_count(),
                keypoints: triplet.to_vec(),
                overlay,
            };
            if self.config.display {
                info!("frame {} {}", frame.index, annotation.display_line());
            }
            annotated.tracks.push(annotation);
        }
        annotated
    }

    /// Surfaces the first-sighted track; other tracks are processed but not
    /// reported.
    fn reduce(&self, artifact: PathBuf, cancelled: bool) -> ProcessingReport {
        let (rep_count, summary) = self
            .tracks
            .first()
            .map(|state| (state.rep_count(), state.power_summary()))
            .unwrap_or_default();
        let metrics = WorkoutMetrics::new(
            rep_count,
            summary.avg_power,
            summary.max_power,
            self.config.body_mass_kg,
            artifact.display().to_string(),
        );
        let counters = self.counters.snapshot();
        self.logger.record(&format!(
            "reduced {} tracks over {} frames ({} skipped): {} reps, avg {:.1} W, max {:.1} W",
            self.tracks.len(),
            counters.frames_processed,
            counters.frames_skipped,
            metrics.rep_count,
            metrics.avg_power,
            metrics.max_power
        ));
        ProcessingReport {
            metrics,
            counters,
            tracks_seen: self.tracks.len(),
            cancelled,
        }
    }
}

/// Rejects frames with repeated track ids or persons missing a keypoint of
/// the configured triplet, before any track state is touched.
fn check_consistency(
    persons: Vec<TrackedPerson>,
    triplet: [usize; 3],
) -> Result<Vec<TrackedPerson>, PoseSourceError> {
    let mut seen = HashSet::with_capacity(persons.len());
    for person in &persons {
        if !seen.insert(person.id) {
            return Err(PoseSourceError::Inconsistent(format!(
                "track {} reported twice",
                person.id
            )));
        }
        if person.triplet(triplet).is_none() {
            return Err(PoseSourceError::Inconsistent(format!(
                "track {} has {} keypoints, triplet needs {:?}",
                person.id,
                person.keypoints.len(),
                triplet
            )));
        }
    }
    Ok(persons)
}

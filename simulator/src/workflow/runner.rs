use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use gymcore::pose_interface::{KeypointRecording, RecordingBackend};
use gymcore::processing::keypoints_in_box;
use gymcore::{CancellationFlag, ProcessingReport, WorkoutProcessor};
use log::warn;
use std::path::Path;
use std::sync::Arc;

/// Share of visible keypoints that must fall inside the framing box.
const FRAMING_THRESHOLD: f32 = 0.8;
const FRAMING_CONFIDENCE: f32 = 0.6;

pub struct WorkflowResult {
    pub report: ProcessingReport,
    /// `None` when no framing box is configured or nobody is in frame 0.
    pub framed: Option<bool>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Processes a saved keypoint recording, which serves as both the pose
    /// source and the input stream.
    pub fn execute(
        &self,
        input: &Path,
        cancel: &CancellationFlag,
    ) -> anyhow::Result<WorkflowResult> {
        let exercise = self.config.to_exercise_config();
        let recording = KeypointRecording::load(input)
            .with_context(|| format!("loading keypoint recording {}", input.display()))?;

        let framed = self.config.framing_box.as_ref().and_then(|area| {
            let subject = recording.frames.first()?.persons.first()?;
            Some(keypoints_in_box(
                subject,
                area,
                FRAMING_THRESHOLD,
                FRAMING_CONFIDENCE,
            ))
        });
        if framed == Some(false) {
            warn!("subject is not inside the framing box on the first frame");
        }

        let processor = WorkoutProcessor::new(
            Arc::new(recording),
            Arc::new(RecordingBackend),
            self.config.output_dir.clone(),
        );
        let report = processor
            .process_video_with_report(input, &exercise, cancel)
            .with_context(|| format!("processing {}", input.display()))?;

        Ok(WorkflowResult { report, framed })
    }
}

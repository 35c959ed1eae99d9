use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pose_interface::keypoint::TrackedPerson;
use crate::pose_interface::source::{PoseSource, PoseSourceError};
use crate::pose_interface::video::{
    Frame, FrameReader, FrameWriter, VideoBackend, VideoHeader,
};
use crate::prelude::{ProcessingError, ProcessingResult};
use crate::processing::annotate::JsonLinesWriter;

/// Pose output captured for a single frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub persons: Vec<TrackedPerson>,
    /// Replays a detector failure for this frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Keypoint tracks captured from an upstream detector, one entry per frame
/// in stream order. Serves as a deterministic [`PoseSource`] and, through
/// [`RecordingBackend`], as the video stream itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeypointRecording {
    pub header: VideoHeader,
    pub frames: Vec<RecordedFrame>,
}

impl KeypointRecording {
    pub fn new(header: VideoHeader) -> Self {
        Self {
            header,
            frames: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, persons: Vec<TrackedPerson>) {
        self.frames.push(RecordedFrame {
            persons,
            error: None,
        });
    }

    pub fn push_failed_frame(&mut self, reason: impl Into<String>) {
        self.frames.push(RecordedFrame {
            persons: Vec::new(),
            error: Some(reason.into()),
        });
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Keeps only the first `frames` entries.
    pub fn truncated(&self, frames: usize) -> Self {
        Self {
            header: self.header,
            frames: self.frames.iter().take(frames).cloned().collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ProcessingResult<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| ProcessingError::StreamOpen {
            path: path_ref.display().to_string(),
            reason: err.to_string(),
        })?;
        let recording: KeypointRecording =
            serde_json::from_str(&contents).map_err(|err| ProcessingError::StreamOpen {
                path: path_ref.display().to_string(),
                reason: err.to_string(),
            })?;
        if !(recording.header.fps.is_finite() && recording.header.fps > 0.0) {
            return Err(ProcessingError::StreamOpen {
                path: path_ref.display().to_string(),
                reason: format!("invalid frame rate {}", recording.header.fps),
            });
        }
        Ok(recording)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ProcessingResult<()> {
        let path_ref = path.as_ref();
        let contents = serde_json::to_string(self)
            .map_err(|err| ProcessingError::Output(err.to_string()))?;
        fs::write(path_ref, contents).map_err(|err| {
            ProcessingError::Output(format!("writing {}: {}", path_ref.display(), err))
        })
    }
}

impl PoseSource for KeypointRecording {
    fn track(&self, frame: &Frame) -> Result<Vec<TrackedPerson>, PoseSourceError> {
        let recorded = usize::try_from(frame.index)
            .ok()
            .and_then(|index| self.frames.get(index))
            .ok_or_else(|| {
                PoseSourceError::Inconsistent(format!("no recorded poses for frame {}", frame.index))
            })?;
        match &recorded.error {
            Some(reason) => Err(PoseSourceError::Inference(reason.clone())),
            None => Ok(recorded.persons.clone()),
        }
    }
}

/// Backend that treats a saved [`KeypointRecording`] as the input stream and
/// writes annotations as JSON lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordingBackend;

struct RecordingReader {
    header: VideoHeader,
    frame_count: u64,
    next: u64,
}

impl FrameReader for RecordingReader {
    fn header(&self) -> VideoHeader {
        self.header
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.next >= self.frame_count {
            return None;
        }
        let frame = Frame::blank(self.next, &self.header);
        self.next += 1;
        Some(frame)
    }
}

impl VideoBackend for RecordingBackend {
    fn open(&self, path: &Path) -> ProcessingResult<Box<dyn FrameReader>> {
        let recording = KeypointRecording::load(path)?;
        Ok(Box::new(RecordingReader {
            header: recording.header,
            frame_count: recording.frame_count() as u64,
            next: 0,
        }))
    }

    fn create_writer(
        &self,
        path: &Path,
        header: &VideoHeader,
    ) -> ProcessingResult<Box<dyn FrameWriter>> {
        Ok(Box::new(JsonLinesWriter::create(path, header)?))
    }
}

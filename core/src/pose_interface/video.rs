use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prelude::ProcessingResult;
use crate::processing::annotate::AnnotatedFrame;

/// Stream properties read from the container header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoHeader {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// A decoded frame. Pixel layout is whatever the backend and pose source
/// agree on; the core only reads `index`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn blank(index: u64, header: &VideoHeader) -> Self {
        Self {
            index,
            width: header.width,
            height: header.height,
            data: Vec::new(),
        }
    }
}

/// An opened input stream. Dropping the reader releases the stream.
pub trait FrameReader {
    fn header(&self) -> VideoHeader;
    /// Next frame in stream order, `None` at end of stream.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Sink for annotated output frames.
pub trait FrameWriter {
    fn write(&mut self, frame: &AnnotatedFrame) -> ProcessingResult<()>;
    /// Flushes and closes the artifact, returning where it was written.
    fn finish(&mut self) -> ProcessingResult<PathBuf>;
}

/// Decoder/encoder collaborator that opens inputs and creates outputs.
pub trait VideoBackend: Send + Sync {
    fn open(&self, path: &Path) -> ProcessingResult<Box<dyn FrameReader>>;
    fn create_writer(
        &self,
        path: &Path,
        header: &VideoHeader,
    ) -> ProcessingResult<Box<dyn FrameWriter>>;
}

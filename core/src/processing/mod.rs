pub mod annotate;
pub mod exercise;
pub mod framing;
pub mod pipeline;
pub mod power;
pub mod tracks;

pub use annotate::{AnnotatedFrame, JsonLinesWriter, TrackAnnotation};
pub use exercise::{ExerciseKind, ExerciseMachine, RepEvent, Stage};
pub use framing::{keypoints_in_box, PixelBox};
pub use pipeline::{CancellationFlag, ProcessingReport, WorkoutProcessor};
pub use power::{power, PowerModel, PowerSummary, GRAVITY};
pub use tracks::{TrackState, TrackStore};

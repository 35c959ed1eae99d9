//! Repetition counting and power estimation for pose-tracked workout videos.
//!
//! The modules follow the frame pipeline: pose-source contracts, joint-angle
//! geometry, the per-track exercise state machines, and the orchestrator that
//! reduces a whole video into a single [`WorkoutMetrics`] record.

pub mod math;
pub mod pose_interface;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use pose_interface::WorkoutMetrics;
pub use prelude::{ExerciseConfig, ProcessingError, ProcessingResult};
pub use processing::{CancellationFlag, ProcessingReport, WorkoutProcessor};

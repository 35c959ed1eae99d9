pub mod angle;
pub mod stats;

pub use angle::{joint_angle, keypoint_angle, NO_ANGLE};
pub use stats::StatsHelper;

use serde::{Deserialize, Serialize};

use crate::pose_interface::keypoint::TrackedPerson;

/// Axis-aligned pixel rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl PixelBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.x1..=self.x2).contains(&x) && (self.y1..=self.y2).contains(&y)
    }
}

/// Whether enough of the person's visible keypoints fall inside `area` to
/// consider them framed for recording. Visible means confidence above
/// `min_confidence`; a person with no visible keypoints is never framed.
pub fn keypoints_in_box(
    person: &TrackedPerson,
    area: &PixelBox,
    threshold: f32,
    min_confidence: f32,
) -> bool {
    let (inside, total) = person
        .keypoints
        .iter()
        .filter(|kp| kp.is_visible(min_confidence))
        .fold((0usize, 0usize), |(inside, total), kp| {
            (inside + usize::from(area.contains(kp.x, kp.y)), total + 1)
        });
    if total == 0 {
        return false;
    }
    inside as f32 / total as f32 >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose_interface::keypoint::Keypoint;

    fn person(points: &[(f32, f32, f32)]) -> TrackedPerson {
        TrackedPerson::new(
            1,
            points
                .iter()
                .map(|&(x, y, c)| Keypoint::new(x, y, c))
                .collect(),
        )
    }

    #[test]
    fn framed_when_fraction_meets_threshold() {
        let area = PixelBox::new(100.0, 100.0, 900.0, 600.0);
        let subject = person(&[
            (150.0, 150.0, 0.9),
            (900.0, 600.0, 0.9),
            (500.0, 300.0, 0.9),
            (950.0, 300.0, 0.9),
        ]);
        assert!(keypoints_in_box(&subject, &area, 0.75, 0.6));
        assert!(!keypoints_in_box(&subject, &area, 0.8, 0.6));
    }

    #[test]
    fn low_confidence_points_are_ignored() {
        let area = PixelBox::new(0.0, 0.0, 10.0, 10.0);
        let subject = person(&[(5.0, 5.0, 0.9), (50.0, 50.0, 0.3)]);
        assert!(keypoints_in_box(&subject, &area, 1.0, 0.6));
    }

    #[test]
    fn nobody_visible_is_not_framed() {
        let area = PixelBox::new(0.0, 0.0, 10.0, 10.0);
        let subject = person(&[(5.0, 5.0, 0.0), (6.0, 6.0, 0.5)]);
        assert!(!keypoints_in_box(&subject, &area, 0.0, 0.6));
    }
}

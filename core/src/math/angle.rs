use crate::pose_interface::keypoint::Keypoint;

/// Returned when no angle can be measured (coincident points or an
/// invisible landmark). Exercise machines never transition on it.
pub const NO_ANGLE: f32 = 0.0;

/// Included angle at `joint` between the segments to `proximal` and
/// `distal`, in degrees within [0, 180].
pub fn joint_angle(proximal: (f32, f32), joint: (f32, f32), distal: (f32, f32)) -> f32 {
    let (ux, uy) = (proximal.0 - joint.0, proximal.1 - joint.1);
    let (vx, vy) = (distal.0 - joint.0, distal.1 - joint.1);
    if (ux == 0.0 && uy == 0.0) || (vx == 0.0 && vy == 0.0) {
        return NO_ANGLE;
    }

    let radians = vy.atan2(vx) - uy.atan2(ux);
    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    if degrees.is_finite() {
        degrees.clamp(0.0, 180.0)
    } else {
        NO_ANGLE
    }
}

/// Angle over a keypoint triplet, `NO_ANGLE` unless every point is visible.
pub fn keypoint_angle(triplet: &[Keypoint; 3], min_confidence: f32) -> f32 {
    if triplet
        .iter()
        .any(|kp| !kp.is_finite() || !kp.is_visible(min_confidence))
    {
        return NO_ANGLE;
    }
    let [p, j, d] = triplet;
    joint_angle((p.x, p.y), (j.x, j.y), (d.x, d.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_angle_at_joint() {
        let angle = joint_angle((0.0, 10.0), (0.0, 0.0), (10.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn straight_limb_is_180() {
        let angle = joint_angle((-5.0, 0.0), (0.0, 0.0), (5.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-4);
    }

    #[test]
    fn reflex_side_folds_back_below_180() {
        // Segments at +170 and -170 degrees differ by 340 one way, 20 the other.
        let angle = joint_angle((-9.848, 1.736), (0.0, 0.0), (-9.848, -1.736));
        assert!((angle - 20.0).abs() < 1e-2);
    }

    #[test]
    fn coincident_points_yield_sentinel() {
        assert_eq!(joint_angle((1.0, 1.0), (1.0, 1.0), (4.0, 5.0)), NO_ANGLE);
        assert_eq!(joint_angle((0.0, 3.0), (1.0, 1.0), (1.0, 1.0)), NO_ANGLE);
    }

    #[test]
    fn invisible_keypoint_yields_sentinel() {
        let triplet = [
            Keypoint::new(0.0, 10.0, 0.9),
            Keypoint::new(0.0, 0.0, 0.0),
            Keypoint::new(10.0, 0.0, 0.9),
        ];
        assert_eq!(keypoint_angle(&triplet, 0.0), NO_ANGLE);

        let visible = [triplet[0], Keypoint::new(0.0, 0.0, 0.8), triplet[2]];
        assert!((keypoint_angle(&visible, 0.5) - 90.0).abs() < 1e-4);
        assert_eq!(keypoint_angle(&visible, 0.85), NO_ANGLE);
    }
}

//! Quaternion to Euler conversion and the coarse orientation scale.

use std::f32::consts::PI;

use emg_types::Quaternion;

/// Number of buckets across a full turn.
pub const ORIENTATION_SCALE: f32 = 18.0;

/// Roll, pitch and yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Orientation reduced to integer buckets in `0..=18`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrientationBuckets {
    pub roll_w: i32,
    pub pitch_w: i32,
    pub yaw_w: i32,
}

pub fn euler_angles(q: &Quaternion) -> EulerAngles {
    let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
    let pitch = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    EulerAngles { roll, pitch, yaw }
}

pub fn discretize(angles: &EulerAngles) -> OrientationBuckets {
    // `as` truncates toward zero; all arguments are non-negative here.
    OrientationBuckets {
        roll_w: ((angles.roll + PI) / (PI * 2.0) * ORIENTATION_SCALE) as i32,
        pitch_w: ((angles.pitch + PI / 2.0) / PI * ORIENTATION_SCALE) as i32,
        yaw_w: ((angles.yaw + PI) / (PI * 2.0) * ORIENTATION_SCALE) as i32,
    }
}

pub fn buckets(q: &Quaternion) -> OrientationBuckets {
    discretize(&euler_angles(q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn about_z(angle: f32) -> Quaternion {
        Quaternion::new((angle / 2.0).cos(), 0.0, 0.0, (angle / 2.0).sin())
    }

    #[test]
    fn identity_maps_to_mid_scale() {
        let b = buckets(&Quaternion::IDENTITY);
        assert_eq!(b, OrientationBuckets { roll_w: 9, pitch_w: 9, yaw_w: 9 });
    }

    #[test]
    fn zero_angles_map_to_mid_scale() {
        let b = discretize(&EulerAngles { roll: 0.0, pitch: 0.0, yaw: 0.0 });
        assert_eq!((b.roll_w, b.pitch_w, b.yaw_w), (9, 9, 9));
    }

    #[test]
    fn extremes_stay_in_range() {
        let low = discretize(&EulerAngles { roll: -PI, pitch: -PI / 2.0, yaw: -PI });
        assert_eq!((low.roll_w, low.pitch_w, low.yaw_w), (0, 0, 0));
        let high = discretize(&EulerAngles { roll: PI, pitch: PI / 2.0, yaw: PI });
        assert_eq!((high.roll_w, high.pitch_w, high.yaw_w), (18, 18, 18));
    }

    #[test]
    fn yaw_quarter_turn() {
        let angles = euler_angles(&about_z(PI / 2.0));
        assert!((angles.yaw - PI / 2.0).abs() < 1e-5);
        assert!(angles.roll.abs() < 1e-5);
        assert!(angles.pitch.abs() < 1e-5);
        // (pi/2 + pi) / 2pi * 18 = 13.5
        assert_eq!(discretize(&angles).yaw_w, 13);
    }

    #[test]
    fn pitch_argument_is_clamped() {
        // Slightly denormalized quaternion pushes the asin argument past 1.
        let q = Quaternion::new(0.7072, 0.0, 0.7072, 0.0);
        let angles = euler_angles(&q);
        assert!(angles.pitch.is_finite());
        assert!((angles.pitch - PI / 2.0).abs() < 1e-3);
    }
}

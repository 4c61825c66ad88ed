//! Quaternion → Euler decomposition and Euclidean distance.
//!
//! The decomposition uses *static* x-y-z axes (roll about X, then pitch about
//! Y, then yaw about Z, all in the fixed world frame), which is the
//! convention localization stacks use when they report roll/pitch/yaw.
//!
//! # Example
//!
//! ```rust
//! use ltlnav_perception::geometry::EulerAngles;
//! use ltlnav_types::Quaternion;
//!
//! let e = EulerAngles::from(Quaternion::from_yaw(0.5));
//! assert!((e.yaw - 0.5).abs() < 1e-12);
//! assert!(e.roll.abs() < 1e-12 && e.pitch.abs() < 1e-12);
//! ```

use ltlnav_types::{Position, Quaternion};

/// Below this the matrix column is treated as degenerate (gimbal lock) and a
/// unit-norm check fails.
const EPS: f64 = f64::EPSILON * 4.0;

// ────────────────────────────────────────────────────────────────────────────
// EulerAngles
// ────────────────────────────────────────────────────────────────────────────

/// Roll, pitch and yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    /// Sum of the three components.
    pub fn sum(self) -> f64 {
        self.roll + self.pitch + self.yaw
    }

    /// Component-wise `self - rhs`.  No wrapping into `(-π, π]` is applied.
    pub fn sub(self, rhs: Self) -> Self {
        Self {
            roll: self.roll - rhs.roll,
            pitch: self.pitch - rhs.pitch,
            yaw: self.yaw - rhs.yaw,
        }
    }
}

impl From<Quaternion> for EulerAngles {
    fn from(q: Quaternion) -> Self {
        let m = rotation_matrix(q);

        let cy = (m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt();
        if cy > EPS {
            Self {
                roll: m[2][1].atan2(m[2][2]),
                pitch: (-m[2][0]).atan2(cy),
                yaw: m[1][0].atan2(m[0][0]),
            }
        } else {
            // Pitch at ±90°: roll and yaw share an axis, attribute it all to roll.
            Self {
                roll: (-m[1][2]).atan2(m[1][1]),
                pitch: (-m[2][0]).atan2(cy),
                yaw: 0.0,
            }
        }
    }
}

/// 3×3 rotation matrix of `q`, normalising first.  A (near-)zero quaternion
/// maps to the identity.
fn rotation_matrix(q: Quaternion) -> [[f64; 3]; 3] {
    let n = q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w;
    if n < EPS {
        return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }
    let s = 2.0 / n;
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    [
        [
            1.0 - s * (y * y + z * z),
            s * (x * y - z * w),
            s * (x * z + y * w),
        ],
        [
            s * (x * y + z * w),
            1.0 - s * (x * x + z * z),
            s * (y * z - x * w),
        ],
        [
            s * (x * z - y * w),
            s * (y * z + x * w),
            1.0 - s * (x * x + y * y),
        ],
    ]
}

/// Euclidean distance between two points.
pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_has_zero_angles() {
        let e = EulerAngles::from(Quaternion::identity());
        assert_eq!(e, EulerAngles::default());
    }

    #[test]
    fn pure_yaw_is_recovered() {
        for yaw in [-3.0, -1.0, 0.3, FRAC_PI_2, 2.9] {
            let e = EulerAngles::from(Quaternion::from_yaw(yaw));
            assert!(close(e.yaw, yaw), "yaw {yaw} decoded as {}", e.yaw);
            assert!(close(e.roll, 0.0));
            assert!(close(e.pitch, 0.0));
        }
    }

    #[test]
    fn pure_roll_is_recovered() {
        let half = FRAC_PI_4 / 2.0;
        let q = Quaternion::new(half.sin(), 0.0, 0.0, half.cos());
        let e = EulerAngles::from(q);
        assert!(close(e.roll, FRAC_PI_4));
        assert!(close(e.pitch, 0.0));
        assert!(close(e.yaw, 0.0));
    }

    #[test]
    fn pure_pitch_is_recovered() {
        let half = 0.4_f64 / 2.0;
        let q = Quaternion::new(0.0, half.sin(), 0.0, half.cos());
        let e = EulerAngles::from(q);
        assert!(close(e.pitch, 0.4));
        assert!(close(e.roll, 0.0));
        assert!(close(e.yaw, 0.0));
    }

    #[test]
    fn non_unit_quaternion_is_normalised() {
        let q = Quaternion::from_yaw(0.7);
        let scaled = Quaternion::new(q.x * 3.0, q.y * 3.0, q.z * 3.0, q.w * 3.0);
        assert!(close(EulerAngles::from(scaled).yaw, 0.7));
    }

    #[test]
    fn gimbal_lock_puts_yaw_at_zero() {
        let half = FRAC_PI_2 / 2.0;
        let q = Quaternion::new(0.0, half.sin(), 0.0, half.cos());
        let e = EulerAngles::from(q);
        assert!(close(e.pitch, FRAC_PI_2));
        assert_eq!(e.yaw, 0.0);
    }

    #[test]
    fn sub_and_sum_keep_sign() {
        let a = EulerAngles { roll: 0.2, pitch: 0.0, yaw: 0.0 };
        let b = EulerAngles { roll: 0.0, pitch: 0.0, yaw: 0.2 };
        assert!(close(a.sub(b).sum(), 0.0));
    }

    #[test]
    fn distance_is_euclidean_in_three_dimensions() {
        let d = distance(Position::new(1.0, 2.0, 3.0), Position::new(4.0, 6.0, 3.0));
        assert!(close(d, 5.0));
        let d = distance(Position::new(0.0, 0.0, 0.0), Position::new(0.0, 0.0, -2.0));
        assert!(close(d, 2.0));
    }
}

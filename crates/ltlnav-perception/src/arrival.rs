//! [`ArrivalEvaluator`] – decides whether a dispatched waypoint was reached.
//!
//! Arrival is judged from the localization estimate alone, never from the
//! navigation controller's own success report, so a goal counts as reached
//! as soon as the robot is *close enough*.
//!
//! Two errors are computed:
//!
//! | Error | Definition |
//! |---|---|
//! | position | Euclidean 3-D distance between current and target position |
//! | orientation | `Σ (current − target)` over roll, pitch and yaw, **signed** |
//!
//! The orientation error is a raw signed sum.  Per-axis differences can
//! cancel (`+0.2` roll and `−0.2` yaw sum to zero) and a large negative
//! difference always passes.
//!
//! # Example
//!
//! ```rust
//! use ltlnav_perception::ArrivalEvaluator;
//! use ltlnav_types::{Pose, Position, Quaternion};
//!
//! let target = Pose::new(Position::new(1.0, 0.0, 0.0), Quaternion::identity());
//! let near = Pose::new(Position::new(1.1, 0.0, 0.0), Quaternion::identity());
//! let far = Pose::new(Position::new(1.2, 0.0, 0.0), Quaternion::identity());
//!
//! assert!(ArrivalEvaluator::arrived(&near, &target));
//! assert!(!ArrivalEvaluator::arrived(&far, &target));
//! ```

use ltlnav_types::Pose;

use crate::geometry::{EulerAngles, distance};

/// Position tolerance in metres.  Arrival requires a strictly smaller error.
pub const POSITION_TOLERANCE_M: f64 = 0.15;

/// Orientation tolerance in radians.  Arrival requires a strictly smaller
/// signed-sum error.
pub const ORIENTATION_TOLERANCE_RAD: f64 = 0.3;

/// The pair of errors between a pose estimate and a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalErrors {
    /// Euclidean distance (metres).
    pub position: f64,
    /// Signed sum of roll, pitch and yaw differences (radians).
    pub orientation: f64,
}

impl ArrivalErrors {
    /// `true` when both errors are strictly below their tolerance.
    pub fn within_tolerance(&self) -> bool {
        self.position < POSITION_TOLERANCE_M && self.orientation < ORIENTATION_TOLERANCE_RAD
    }
}

/// Stateless arrival policy.  Every method is a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalEvaluator;

impl ArrivalEvaluator {
    /// Compute both errors of `current` relative to `target`.
    pub fn errors(current: &Pose, target: &Pose) -> ArrivalErrors {
        let current_euler = EulerAngles::from(current.orientation);
        let target_euler = EulerAngles::from(target.orientation);
        ArrivalErrors {
            position: distance(current.position, target.position),
            orientation: current_euler.sub(target_euler).sum(),
        }
    }

    /// `true` when `current` counts as having reached `target`.
    pub fn arrived(current: &Pose, target: &Pose) -> bool {
        Self::errors(current, target).within_tolerance()
    }
}

//! Waypoint → navigation goal translation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ltlnav_types::{MAP_FRAME, NavigationGoal, Waypoint};

/// Builds [`NavigationGoal`]s in the map frame.  Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalTranslator;

impl GoalTranslator {
    /// Translate `waypoint` into a goal tagged with `sequence_id`.
    ///
    /// `stamp` is the wall-clock dispatch time and `elapsed` the time since
    /// the current execution epoch began.  Position and orientation are
    /// copied through unchanged, including `z`.
    pub fn to_goal(
        waypoint: &Waypoint,
        sequence_id: u64,
        stamp: DateTime<Utc>,
        elapsed: Duration,
    ) -> NavigationGoal {
        NavigationGoal {
            frame_id: MAP_FRAME.to_string(),
            pose: *waypoint,
            sequence_id,
            stamp,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltlnav_types::{Pose, Position, Quaternion};

    #[test]
    fn goal_is_in_map_frame_and_copies_pose() {
        let wp = Pose::new(Position::new(1.5, -2.0, 0.25), Quaternion::from_yaw(0.7));
        let stamp = Utc::now();
        let goal = GoalTranslator::to_goal(&wp, 42, stamp, Duration::from_secs(3));

        assert_eq!(goal.frame_id, "map");
        assert_eq!(goal.pose, wp);
        assert_eq!(goal.sequence_id, 42);
        assert_eq!(goal.stamp, stamp);
        assert_eq!(goal.elapsed, Duration::from_secs(3));
    }

    #[test]
    fn translation_is_deterministic() {
        let wp = Pose::new(Position::new(3.0, 4.0, 0.0), Quaternion::identity());
        let stamp = Utc::now();
        let a = GoalTranslator::to_goal(&wp, 1, stamp, Duration::ZERO);
        let b = GoalTranslator::to_goal(&wp, 1, stamp, Duration::ZERO);
        assert_eq!(a, b);
    }
}

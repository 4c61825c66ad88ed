//! In-process robot simulation for headless runs and tests.
//!
//! [`SimulatedBase`] stands in for both the localization subsystem and the
//! navigation controller: it listens on [`Topic::NavigationGoals`], "drives"
//! to each goal for a fixed travel time, and then publishes a pose estimate
//! exactly at the goal on [`Topic::Pose`].
//!
//! A goal that arrives while the base is still travelling supersedes the
//! previous one, the way a real action server treats a fresh goal.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ltlnav_middleware::{EventBus, SimulatedBase};
//!
//! # async fn demo() {
//! let bus = Arc::new(EventBus::default());
//! let handle = SimulatedBase::new(Arc::clone(&bus), Duration::from_millis(500)).spawn();
//! # handle.abort();
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ltlnav_types::{EventPayload, NavError, NavigationGoal, Pose, PoseEstimate};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, Topic, TopicReceiver};

/// Event source tag for poses published by the simulation.
pub const SOURCE: &str = "ltlnav-middleware::sim";

/// A simulated robot base that teleports to each goal after `travel_time`.
pub struct SimulatedBase {
    bus: Arc<EventBus>,
    travel_time: Duration,
    goals: TopicReceiver,
}

impl SimulatedBase {
    /// Create a simulated base.  It subscribes to goals immediately, so goals
    /// published before [`spawn`][Self::spawn] are not lost.
    pub fn new(bus: Arc<EventBus>, travel_time: Duration) -> Self {
        let goals = bus.subscribe_to(Topic::NavigationGoals);
        Self {
            bus,
            travel_time,
            goals,
        }
    }

    /// Publish a pose estimate at `pose`, as localization would.
    pub fn publish_pose(bus: &EventBus, pose: Pose) -> Result<usize, NavError> {
        bus.emit(SOURCE, EventPayload::Pose(PoseEstimate::at(pose)))
    }

    /// Run the simulation on the current Tokio runtime.  Abort the returned
    /// handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let Self {
            bus,
            travel_time,
            mut goals,
        } = self;
        let mut pending: Option<NavigationGoal> = None;
        loop {
            let next = match pending.take() {
                Some(goal) => {
                    tokio::select! {
                        _ = tokio::time::sleep(travel_time) => {
                            arrive(&bus, &goal);
                            continue;
                        }
                        received = goals.recv() => received,
                    }
                }
                None => goals.recv().await,
            };

            match next {
                Ok(event) => {
                    if let EventPayload::NavigationGoal(goal) = event.payload {
                        debug!(sequence_id = goal.sequence_id, "sim: travelling to goal");
                        pending = Some(goal);
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "sim: goal receiver lagged");
                }
                Err(RecvError::Closed) => {
                    info!("sim: event bus closed, stopping");
                    return;
                }
            }
        }
    }
}

fn arrive(bus: &EventBus, goal: &NavigationGoal) {
    debug!(sequence_id = goal.sequence_id, "sim: reached goal");
    if let Err(e) = SimulatedBase::publish_pose(bus, goal.pose) {
        warn!(error = %e, "sim: failed to publish pose");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ltlnav_types::{Event, MAP_FRAME, Position, Quaternion};

    fn goal(seq: u64, x: f64) -> NavigationGoal {
        NavigationGoal {
            frame_id: MAP_FRAME.to_string(),
            pose: Pose::new(Position::new(x, 0.0, 0.0), Quaternion::identity()),
            sequence_id: seq,
            stamp: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    fn send(bus: &EventBus, g: NavigationGoal) {
        bus.publish_to(
            Topic::NavigationGoals,
            Event::new("test", EventPayload::NavigationGoal(g)),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn publishes_pose_at_goal_after_travel() {
        let bus = Arc::new(EventBus::default());
        let mut poses = bus.subscribe_to(Topic::Pose);
        let handle = SimulatedBase::new(Arc::clone(&bus), Duration::from_millis(10)).spawn();

        send(&bus, goal(0, 4.0));

        let event = tokio::time::timeout(Duration::from_secs(1), poses.recv())
            .await
            .expect("pose within a second")
            .unwrap();
        match event.payload {
            EventPayload::Pose(estimate) => {
                assert_eq!(estimate.pose.position, Position::new(4.0, 0.0, 0.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn newer_goal_supersedes_travel() {
        let bus = Arc::new(EventBus::default());
        let mut poses = bus.subscribe_to(Topic::Pose);
        let handle = SimulatedBase::new(Arc::clone(&bus), Duration::from_millis(100)).spawn();

        send(&bus, goal(0, 1.0));
        send(&bus, goal(1, 2.0));

        let event = tokio::time::timeout(Duration::from_secs(1), poses.recv())
            .await
            .expect("pose within a second")
            .unwrap();
        match event.payload {
            EventPayload::Pose(estimate) => {
                assert_eq!(estimate.pose.position.x, 2.0, "first goal must be superseded");
            }
            other => panic!("unexpected payload {other:?}"),
        }
        handle.abort();
    }
}

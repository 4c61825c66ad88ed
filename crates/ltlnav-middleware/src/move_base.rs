//! `move_base`-style navigation adapter.
//!
//! [`MoveBaseAdapter`] bridges the execution core and a goal-based navigation
//! action server reachable over the [`EventBus`]:
//!
//! * **Outbound** – every [`NavigationGoal`] is published on
//!   [`Topic::NavigationGoals`] and its `MoveBaseGoal` JSON frame (see
//!   [`encode_goal`]) is logged at debug level for the bridge.
//!
//! * **Readiness** – the transport calls [`MoveBaseAdapter::mark_server_ready`]
//!   once the action server is up; [`NavigationClient::wait_for_server`]
//!   resolves from then on.

use std::sync::Arc;

use async_trait::async_trait;
use ltlnav_types::{EventPayload, NavError, NavigationGoal};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::adapter::NavigationClient;
use crate::bus::EventBus;

/// Event source tag for goals published by this adapter.
pub const SOURCE: &str = "ltlnav-middleware::move_base";

/// Adapter that publishes goals for a `move_base`-style action server.
pub struct MoveBaseAdapter {
    bus: Arc<EventBus>,
    action_name: String,
    ready: watch::Sender<bool>,
}

impl MoveBaseAdapter {
    /// Create an adapter for the action server named `action_name`
    /// (typically `"move_base"`).  The server starts out not ready.
    pub fn new(bus: Arc<EventBus>, action_name: impl Into<String>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            bus,
            action_name: action_name.into(),
            ready,
        }
    }

    /// Record that the action server is up and accepting goals.
    pub fn mark_server_ready(&self) {
        info!(action = %self.action_name, "navigation action server is ready");
        self.ready.send_replace(true);
    }

    /// `true` once [`mark_server_ready`][Self::mark_server_ready] was called.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }
}

/// Encode `goal` as the JSON body of a `MoveBaseGoal`.
pub fn encode_goal(action_name: &str, goal: &NavigationGoal) -> Value {
    let p = goal.pose.position;
    let q = goal.pose.orientation;
    json!({
        "op": "send_goal",
        "action": action_name,
        "goal": {
            "target_pose": {
                "header": {
                    "seq": goal.sequence_id,
                    "stamp": goal.stamp.to_rfc3339(),
                    "frame_id": goal.frame_id,
                },
                "pose": {
                    "position": { "x": p.x, "y": p.y, "z": p.z },
                    "orientation": { "x": q.x, "y": q.y, "z": q.z, "w": q.w },
                }
            }
        }
    })
}

#[async_trait]
impl NavigationClient for MoveBaseAdapter {
    async fn wait_for_server(&self) -> Result<(), NavError> {
        let mut rx = self.ready.subscribe();
        rx.wait_for(|ready| *ready)
            .await
            .map_err(|e| NavError::ServerUnavailable(format!("{}: {e}", self.action_name)))?;
        Ok(())
    }

    fn send_goal(&self, goal: &NavigationGoal) -> Result<(), NavError> {
        if !self.is_ready() {
            return Err(NavError::ServerUnavailable(format!(
                "{} has not come up yet",
                self.action_name
            )));
        }
        let frame = encode_goal(&self.action_name, goal);
        debug!(sequence_id = goal.sequence_id, %frame, "sending navigation goal");
        self.bus
            .emit(SOURCE, EventPayload::NavigationGoal(goal.clone()))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use chrono::Utc;
    use ltlnav_types::{MAP_FRAME, Pose, Position, Quaternion};
    use std::time::Duration;

    fn goal(seq: u64) -> NavigationGoal {
        NavigationGoal {
            frame_id: MAP_FRAME.to_string(),
            pose: Pose::new(Position::new(1.0, 2.0, 0.0), Quaternion::from_yaw(0.5)),
            sequence_id: seq,
            stamp: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn send_before_ready_is_rejected() {
        let adapter = MoveBaseAdapter::new(Arc::new(EventBus::default()), "move_base");
        let result = adapter.send_goal(&goal(0));
        assert!(matches!(result, Err(NavError::ServerUnavailable(_))));
    }

    #[tokio::test]
    async fn wait_for_server_resolves_after_ready() {
        let adapter = Arc::new(MoveBaseAdapter::new(Arc::new(EventBus::default()), "move_base"));

        let pending = tokio::time::timeout(Duration::from_millis(30), adapter.wait_for_server()).await;
        assert!(pending.is_err(), "server must not be ready yet");

        let waiter = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.wait_for_server().await })
        };
        adapter.mark_server_ready();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_for_server must resolve")
            .expect("task must not panic");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn send_publishes_goal_on_navigation_topic() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe_to(Topic::NavigationGoals);
        let adapter = MoveBaseAdapter::new(Arc::clone(&bus), "move_base");
        adapter.mark_server_ready();

        let sent = goal(3);
        adapter.send_goal(&sent).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.source, SOURCE);
        match event.payload {
            EventPayload::NavigationGoal(g) => assert_eq!(g, sent),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn encoded_goal_has_move_base_shape() {
        let g = goal(9);
        let frame = encode_goal("move_base", &g);
        let target = &frame["goal"]["target_pose"];
        assert_eq!(target["header"]["seq"], 9);
        assert_eq!(target["header"]["frame_id"], "map");
        assert_eq!(target["pose"]["position"]["x"], 1.0);
        assert_eq!(target["pose"]["position"]["y"], 2.0);
        assert_eq!(target["pose"]["orientation"]["w"], g.pose.orientation.w);
        assert_eq!(frame["action"], "move_base");
    }
}

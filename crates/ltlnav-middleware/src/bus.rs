//! Typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Pose`] | Periodic localization estimates |
//! | [`Topic::Activation`] | Operator start/stop switch |
//! | [`Topic::Task`] | Hard/soft task formulas and the initial pose from the GUI |
//! | [`Topic::NavigationGoals`] | Goals handed to the navigation controller |
//! | [`Topic::PlanDiagnostics`] | Prefix and suffix of the synthesized run |
//! | [`Topic::SystemAlerts`] | Startup and synthesis faults |

use ltlnav_types::{Event, EventPayload, NavError};
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Pose estimates from localization.
    Pose,
    /// Activation flag toggles.
    Activation,
    /// Task formulas and initial pose, read during startup.
    Task,
    /// Goals sent to the navigation controller.
    NavigationGoals,
    /// Synthesized plan, for visualization.
    PlanDiagnostics,
    /// Fatal conditions that stop plan progress.
    SystemAlerts,
}

impl Topic {
    /// The topic an event payload is normally routed on.
    pub fn for_payload(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Pose(_) => Topic::Pose,
            EventPayload::Activation(_) => Topic::Activation,
            EventPayload::Task { .. } | EventPayload::InitialPose(_) => Topic::Task,
            EventPayload::NavigationGoal(_) => Topic::NavigationGoals,
            EventPayload::PrefixPlan(_) | EventPayload::SuffixPlan(_) => Topic::PlanDiagnostics,
            EventPayload::Fault { .. } => Topic::SystemAlerts,
        }
    }
}

/// Shared event bus.  Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    pose: broadcast::Sender<Event>,
    activation: broadcast::Sender<Event>,
    task: broadcast::Sender<Event>,
    navigation_goals: broadcast::Sender<Event>,
    plan_diagnostics: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (pose, _) = broadcast::channel(capacity);
        let (activation, _) = broadcast::channel(capacity);
        let (task, _) = broadcast::channel(capacity);
        let (navigation_goals, _) = broadcast::channel(capacity);
        let (plan_diagnostics, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            pose,
            activation,
            task,
            navigation_goals,
            plan_diagnostics,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event.
    /// Returns `Ok(0)` when no subscribers are currently listening on the
    /// topic; that is a normal condition for diagnostics nobody watches.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, NavError> {
        let sender = self.topic_sender(topic);
        if sender.receiver_count() == 0 {
            return Ok(0);
        }
        sender
            .send(event)
            .map_err(|e| NavError::Channel(format!("{topic:?} send error: {e}")))
    }

    /// Wrap `payload` in an [`Event`] from `source` and publish it on the
    /// payload's default topic.
    pub fn emit(&self, source: &str, payload: EventPayload) -> Result<usize, NavError> {
        let topic = Topic::for_payload(&payload);
        self.publish_to(topic, Event::new(source, payload))
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Pose => &self.pose,
            Topic::Activation => &self.activation,
            Topic::Task => &self.task,
            Topic::NavigationGoals => &self.navigation_goals,
            Topic::PlanDiagnostics => &self.plan_diagnostics,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`][Self::recv].
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltlnav_types::{Pose, PoseEstimate};

    fn pose_event() -> Event {
        Event::new("test::amcl", EventPayload::Pose(PoseEstimate::at(Pose::default())))
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut first = bus.subscribe_to(Topic::Pose);
        let mut second = bus.subscribe_to(Topic::Pose);

        let event = pose_event();
        assert_eq!(bus.publish_to(Topic::Pose, event.clone())?, 2);

        assert_eq!(first.recv().await?.id, event.id);
        assert_eq!(second.recv().await?.id, event.id);
        Ok(())
    }

    #[tokio::test]
    async fn subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
        let _poses = bus.subscribe_to(Topic::Pose);

        bus.publish_to(Topic::Pose, pose_event())?;

        let result = tokio::time::timeout(std::time::Duration::from_millis(50), alerts.recv()).await;
        assert!(result.is_err(), "SystemAlerts subscriber must not see a Pose event");
        Ok(())
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.publish_to(Topic::PlanDiagnostics, pose_event()), Ok(0));
    }

    #[tokio::test]
    async fn emit_routes_by_payload() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut activation = bus.subscribe_to(Topic::Activation);
        bus.emit("test::gui", EventPayload::Activation(true))?;
        let event = activation.recv().await?;
        assert!(matches!(event.payload, EventPayload::Activation(true)));
        assert_eq!(activation.topic(), Topic::Activation);
        Ok(())
    }

    #[test]
    fn payload_topic_mapping() {
        assert_eq!(Topic::for_payload(&EventPayload::SuffixPlan(vec![])), Topic::PlanDiagnostics);
        assert_eq!(
            Topic::for_payload(&EventPayload::InitialPose(Pose::default())),
            Topic::Task
        );
        assert_eq!(
            Topic::for_payload(&EventPayload::Fault {
                component: "x".into(),
                message: "y".into()
            }),
            Topic::SystemAlerts
        );
    }

    #[tokio::test]
    async fn slow_subscriber_reports_lag() {
        let bus = EventBus::new(16);
        let mut slow = bus.subscribe_to(Topic::Pose);
        for _ in 0..100 {
            let _ = bus.publish_to(Topic::Pose, pose_event());
        }
        let result = slow.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }
}

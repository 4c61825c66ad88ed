//! [`PlannerNode`] – startup sequence and event loop around the controller.
//!
//! # Startup
//!
//! 1. Listen on [`Topic::Task`] for the startup window, keeping the latest
//!    hard task, soft task and initial pose.  Missing values fall back to
//!    [`NodeConfig::defaults`]; no initial pose from either source is fatal.
//! 2. Synthesize the run.
//! 3. Publish its prefix and suffix positions on [`Topic::PlanDiagnostics`].
//! 4. Wait for the navigation server, bounded by
//!    [`NodeConfig::server_timeout`].
//!
//! # Event loop
//!
//! [`PlannerNode::run`] feeds [`Topic::Pose`] and [`Topic::Activation`]
//! events into the [`PlanExecutionController`].  Task events that arrive
//! after startup are logged and dropped.  Synthesis-fatal errors are
//! published as a `Fault` on [`Topic::SystemAlerts`].

use std::sync::Arc;
use std::time::Duration;

use ltlnav_middleware::{EventBus, NavigationClient, Topic, TopicReceiver};
use ltlnav_types::{Event, EventPayload, NavError, Pose, Run, TaskKind, TaskSpec};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, instrument, warn};

use crate::controller::PlanExecutionController;
use crate::dispatcher::GoalDispatcher;
use crate::synthesizer::Synthesizer;

/// Event source tag for everything the node publishes.
pub const SOURCE: &str = "ltlnav-runtime::node";

/// Default time spent collecting tasks before the first synthesis.
pub const DEFAULT_STARTUP_WINDOW: Duration = Duration::from_secs(3);

/// Default bound on the navigation-server readiness wait.
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(120);

/// Startup parameters for a [`PlannerNode`].
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub robot_name: String,
    pub startup_window: Duration,
    pub server_timeout: Duration,
    /// Used for any task or initial pose not received during the window.
    pub defaults: TaskSpec,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            robot_name: "robot".to_string(),
            startup_window: DEFAULT_STARTUP_WINDOW,
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            defaults: TaskSpec::default(),
        }
    }
}

/// A started planner: synthesized run, ready navigation server, dormant
/// controller.
pub struct PlannerNode {
    bus: Arc<EventBus>,
    controller: Arc<PlanExecutionController>,
    plan: Run,
    task: TaskSpec,
    robot_name: String,
    poses: TopicReceiver,
    activation: TopicReceiver,
    tasks: TopicReceiver,
}

impl PlannerNode {
    /// Run the startup sequence.
    ///
    /// Pose and activation events published while startup is in progress are
    /// buffered and handled once [`run`][Self::run] starts.
    pub async fn start(
        bus: Arc<EventBus>,
        mut synthesizer: Box<dyn Synthesizer>,
        client: Arc<dyn NavigationClient>,
        config: NodeConfig,
    ) -> Result<Self, NavError> {
        let mut tasks = bus.subscribe_to(Topic::Task);
        let poses = bus.subscribe_to(Topic::Pose);
        let activation = bus.subscribe_to(Topic::Activation);

        let task = collect_task(&mut tasks, config.startup_window, &config.defaults).await?;
        info!(
            robot = %config.robot_name,
            hard = %task.hard_task,
            soft = %task.soft_task,
            "task captured"
        );

        let plan = match synthesizer.synthesize(&task) {
            Ok(plan) => plan,
            Err(e) => {
                report_fault(&bus, &e);
                return Err(e);
            }
        };
        publish_plan(&bus, &plan);

        info!(timeout_s = config.server_timeout.as_secs_f64(), "waiting for navigation server");
        match tokio::time::timeout(config.server_timeout, client.wait_for_server()).await {
            Ok(ready) => ready?,
            Err(_) => return Err(NavError::ServerTimeout(config.server_timeout)),
        }
        info!("navigation server ready; planner dormant until activated");

        let controller = Arc::new(PlanExecutionController::new(
            synthesizer,
            GoalDispatcher::new(client),
        ));
        Ok(Self {
            bus,
            controller,
            plan,
            task,
            robot_name: config.robot_name,
            poses,
            activation,
            tasks,
        })
    }

    /// Shared handle for status queries and direct activation.
    pub fn controller(&self) -> Arc<PlanExecutionController> {
        Arc::clone(&self.controller)
    }

    /// The synthesized run.
    pub fn plan(&self) -> &Run {
        &self.plan
    }

    /// The task the run was synthesized for.
    pub fn task(&self) -> &TaskSpec {
        &self.task
    }

    /// Process events until the bus closes.  Abort the task to stop earlier.
    #[instrument(name = "planner", skip_all, fields(robot = %self.robot_name))]
    pub async fn run(mut self) {
        loop {
            let (topic, received) = tokio::select! {
                r = self.poses.recv() => (Topic::Pose, r),
                r = self.activation.recv() => (Topic::Activation, r),
                r = self.tasks.recv() => (Topic::Task, r),
            };
            match received {
                Ok(event) => self.handle(event),
                Err(RecvError::Lagged(n)) => warn!(?topic, lagged_by = n, "receiver lagged"),
                Err(RecvError::Closed) => {
                    info!("event bus closed; planner stopping");
                    return;
                }
            }
        }
    }

    fn handle(&self, event: Event) {
        let result = match event.payload {
            EventPayload::Pose(estimate) => self.controller.on_pose(&estimate).map(|_| ()),
            EventPayload::Activation(active) => self.controller.set_active(active).map(|_| ()),
            EventPayload::Task { kind, formula } => {
                warn!(%kind, %formula, "task changes after startup are not supported; ignoring");
                Ok(())
            }
            EventPayload::InitialPose(_) => {
                debug!("initial pose after startup ignored");
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            report_fault(&self.bus, &e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Received {
    hard: Option<String>,
    soft: Option<String>,
    initial_pose: Option<Pose>,
}

impl Received {
    fn complete(&self) -> bool {
        self.hard.is_some() && self.soft.is_some() && self.initial_pose.is_some()
    }
}

/// Gather task formulas and the initial pose for at most `window`, returning
/// early once all three have arrived.
async fn collect_task(
    tasks: &mut TopicReceiver,
    window: Duration,
    defaults: &TaskSpec,
) -> Result<TaskSpec, NavError> {
    let deadline = tokio::time::Instant::now() + window;
    let mut received = Received::default();

    while !received.complete() {
        let event = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            r = tasks.recv() => r,
        };
        match event {
            Ok(event) => match event.payload {
                EventPayload::Task { kind: TaskKind::Hard, formula } => received.hard = Some(formula),
                EventPayload::Task { kind: TaskKind::Soft, formula } => received.soft = Some(formula),
                EventPayload::InitialPose(pose) => received.initial_pose = Some(pose),
                _ => {}
            },
            Err(RecvError::Lagged(n)) => warn!(lagged_by = n, "task receiver lagged during startup"),
            Err(RecvError::Closed) => break,
        }
    }

    if received.hard.is_none() {
        debug!("no hard task received; using configured default");
    }
    let initial_pose = received
        .initial_pose
        .or(defaults.initial_pose)
        .ok_or(NavError::NoInitialPose)?;
    Ok(TaskSpec {
        hard_task: received.hard.unwrap_or_else(|| defaults.hard_task.clone()),
        soft_task: received.soft.unwrap_or_else(|| defaults.soft_task.clone()),
        initial_pose: Some(initial_pose),
    })
}

fn publish_plan(bus: &EventBus, plan: &Run) {
    let prefix = plan.prefix().iter().map(|w| w.position).collect();
    let suffix = plan.suffix().iter().map(|w| w.position).collect();
    for payload in [EventPayload::PrefixPlan(prefix), EventPayload::SuffixPlan(suffix)] {
        if let Err(e) = bus.emit(SOURCE, payload) {
            warn!(error = %e, "failed to publish plan diagnostics");
        }
    }
    info!(
        prefix = plan.prefix().len(),
        suffix = plan.suffix().len(),
        "published plan diagnostics"
    );
}

fn report_fault(bus: &EventBus, err: &NavError) {
    if !err.is_synthesis_fatal() {
        warn!(error = %err, "planner step failed");
        return;
    }
    error!(error = %err, "synthesis-fatal condition");
    let payload = EventPayload::Fault {
        component: "planner".to_string(),
        message: err.to_string(),
    };
    if let Err(e) = bus.emit(SOURCE, payload) {
        warn!(error = %e, "failed to publish fault");
    }
}

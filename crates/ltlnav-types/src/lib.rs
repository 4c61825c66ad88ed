//! `ltlnav-types` – shared data model for the ltlnav workspace.
//!
//! Everything that crosses a crate boundary lives here: the geometric
//! primitives a plan is made of, the [`Run`] produced by the temporal-logic
//! synthesizer, the [`NavigationGoal`] handed to the motion controller, the
//! [`Event`] envelope routed over the event bus, and the workspace-wide
//! [`NavError`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Frame every navigation goal is expressed in.
pub const MAP_FRAME: &str = "map";

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// A point in the world frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A unit quaternion.  Fields are named so the `(w, x, y, z)` vs
/// `(x, y, z, w)` ordering question never arises at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `yaw` radians about the world Z axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position plus orientation in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position,
    #[serde(default)]
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Position, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// A single navigation target in a [`Run`].  Immutable once produced by the
/// planner.
pub type Waypoint = Pose;

/// A pose estimate as published by the localization subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pose: Pose,
    /// Row-major 6×6 covariance.  Carried through, never read by the
    /// execution core.
    #[serde(default)]
    pub covariance: Vec<f64>,
    pub stamp: DateTime<Utc>,
}

impl PoseEstimate {
    /// An estimate at `pose` with zero covariance, stamped now.
    pub fn at(pose: Pose) -> Self {
        Self {
            pose,
            covariance: vec![0.0; 36],
            stamp: Utc::now(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Plans
// ────────────────────────────────────────────────────────────────────────────

/// The synthesized plan: a `prefix` executed once followed by a `suffix`
/// repeated forever.
///
/// The suffix is guaranteed non-empty; [`Run::new`] and deserialization both
/// reject an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RunParts")]
pub struct Run {
    prefix: Vec<Waypoint>,
    suffix: Vec<Waypoint>,
}

#[derive(Deserialize)]
struct RunParts {
    #[serde(default)]
    prefix: Vec<Waypoint>,
    #[serde(default)]
    suffix: Vec<Waypoint>,
}

impl TryFrom<RunParts> for Run {
    type Error = NavError;

    fn try_from(parts: RunParts) -> Result<Self, Self::Error> {
        Run::new(parts.prefix, parts.suffix)
    }
}

impl Run {
    /// Build a run, rejecting a zero-length suffix.
    pub fn new(prefix: Vec<Waypoint>, suffix: Vec<Waypoint>) -> Result<Self, NavError> {
        if suffix.is_empty() {
            return Err(NavError::EmptySuffix);
        }
        Ok(Self { prefix, suffix })
    }

    pub fn prefix(&self) -> &[Waypoint] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[Waypoint] {
        &self.suffix
    }
}

/// Which of the two task channels a formula arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Must be satisfied by every run.
    Hard,
    /// Satisfied as well as possible.
    Soft,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Hard => write!(f, "hard"),
            TaskKind::Soft => write!(f, "soft"),
        }
    }
}

/// Task formulas and initial pose captured once before the first synthesis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub hard_task: String,
    pub soft_task: String,
    pub initial_pose: Option<Pose>,
}

/// The synthesizer's answer to "where next?".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub waypoint: Waypoint,
    /// Opaque progress tag; used as the goal sequence id.
    pub progress_index: u64,
}

/// A single goal for the point-to-point navigation controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationGoal {
    pub frame_id: String,
    pub pose: Pose,
    pub sequence_id: u64,
    /// Wall-clock time of dispatch.
    pub stamp: DateTime<Utc>,
    /// Time since the current execution epoch started.
    pub elapsed: Duration,
}

// ────────────────────────────────────────────────────────────────────────────
// Bus envelope
// ────────────────────────────────────────────────────────────────────────────

/// Unified event wrapper for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "ltlnav-middleware::move_base"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped now.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// Localization output (`amcl_pose`).
    Pose(PoseEstimate),
    /// Operator start/stop switch (`planner_active`).
    Activation(bool),
    /// A task formula from the GUI.
    Task { kind: TaskKind, formula: String },
    /// Initial pose from the GUI, used for the first synthesis.
    InitialPose(Pose),
    /// A goal handed to the navigation controller.
    NavigationGoal(NavigationGoal),
    /// Positions of the synthesized prefix, in order.
    PrefixPlan(Vec<Position>),
    /// Positions of the synthesized suffix, in order.
    SuffixPlan(Vec<Position>),
    Fault { component: String, message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type spanning plan validity, synthesis failures,
/// startup failures and transport errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavError {
    #[error("Run rejected: suffix must contain at least one waypoint")]
    EmptySuffix,

    #[error("Synthesizer has no valid next move after progress index {progress_index}")]
    NoMoreMoves { progress_index: u64 },

    #[error("Task unsatisfiable: {0}")]
    Unsatisfiable(String),

    #[error("Plan was synthesized for {kind} task '{expected}', received '{received}'")]
    TaskMismatch {
        kind: TaskKind,
        expected: String,
        received: String,
    },

    #[error("No initial pose received within the startup window")]
    NoInitialPose,

    #[error("Navigation server not ready after {0:?}")]
    ServerTimeout(Duration),

    #[error("Navigation server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("Event bus error: {0}")]
    Channel(String),

    #[error("Plan file error: {0}")]
    Plan(String),
}

impl NavError {
    /// `true` for errors that stop plan progress for the rest of the run.
    pub fn is_synthesis_fatal(&self) -> bool {
        matches!(
            self,
            NavError::NoMoreMoves { .. }
                | NavError::Unsatisfiable(_)
                | NavError::TaskMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(x: f64) -> Waypoint {
        Pose::new(Position::new(x, 0.0, 0.0), Quaternion::identity())
    }

    #[test]
    fn run_rejects_empty_suffix() {
        assert_eq!(Run::new(vec![wp(0.0)], vec![]), Err(NavError::EmptySuffix));
    }

    #[test]
    fn run_accepts_empty_prefix() {
        let run = Run::new(vec![], vec![wp(1.0)]).unwrap();
        assert!(run.prefix().is_empty());
        assert_eq!(run.suffix().len(), 1);
    }

    #[test]
    fn run_deserialization_enforces_suffix_invariant() {
        let json = r#"{"prefix":[{"position":{"x":0.0,"y":0.0,"z":0.0}}],"suffix":[]}"#;
        assert!(serde_json::from_str::<Run>(json).is_err());

        let json = r#"{"suffix":[{"position":{"x":1.0,"y":2.0,"z":0.0}}]}"#;
        let run: Run = serde_json::from_str(json).unwrap();
        assert_eq!(run.suffix()[0].position, Position::new(1.0, 2.0, 0.0));
        assert_eq!(run.suffix()[0].orientation, Quaternion::identity());
    }

    #[test]
    fn yaw_quaternion_is_unit() {
        let q = Quaternion::from_yaw(1.2);
        let norm = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn event_carries_goal_through_json() {
        let goal = NavigationGoal {
            frame_id: MAP_FRAME.to_string(),
            pose: wp(2.0),
            sequence_id: 7,
            stamp: Utc::now(),
            elapsed: Duration::from_millis(1500),
        };
        let event = Event::new("ltlnav-runtime::dispatcher", EventPayload::NavigationGoal(goal.clone()));
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        match back.payload {
            EventPayload::NavigationGoal(g) => assert_eq!(g, goal),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn nav_error_display_and_classification() {
        let err = NavError::NoMoreMoves { progress_index: 4 };
        assert!(err.to_string().contains("4"));
        assert!(err.is_synthesis_fatal());
        assert!(!NavError::NoInitialPose.is_synthesis_fatal());

        let mismatch = NavError::TaskMismatch {
            kind: TaskKind::Hard,
            expected: "<>r1".into(),
            received: "<>r2".into(),
        };
        assert!(mismatch.to_string().contains("hard task"));
    }
}

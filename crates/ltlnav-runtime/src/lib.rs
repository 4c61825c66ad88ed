//! `ltlnav-runtime` – plan execution core.
//!
//! Turns a synthesized prefix/suffix [`Run`][ltlnav_types::Run] into a stream
//! of navigation goals, one at a time, advancing whenever the robot's pose
//! estimate says the in-flight goal was reached.
//!
//! # Modules
//!
//! - [`plan_cursor`] – [`PlanCursor`]: prefix-once, suffix-forever iteration.
//! - [`goal`] – [`GoalTranslator`]: waypoint → map-frame navigation goal.
//! - [`dispatcher`] – [`GoalDispatcher`]: owns the single in-flight goal.
//! - [`synthesizer`] – the [`Synthesizer`] seam and [`ReplaySynthesizer`].
//! - [`controller`] – [`PlanExecutionController`]: the activation/arrival
//!   state machine.
//! - [`node`] – [`PlannerNode`]: startup sequence and bus event loop.
//! - [`telemetry`] – tracing subscriber and OTLP export setup.

pub mod controller;
pub mod dispatcher;
pub mod goal;
pub mod node;
pub mod plan_cursor;
pub mod synthesizer;
pub mod telemetry;

pub use controller::{ActivationOutcome, ControllerState, ControllerStatus, PlanExecutionController, PoseOutcome};
pub use dispatcher::{ActiveGoal, GoalDispatcher};
pub use goal::GoalTranslator;
pub use node::{NodeConfig, PlannerNode};
pub use plan_cursor::{CursorPhase, PlanCursor};
pub use synthesizer::{ReplaySynthesizer, Synthesizer};

//! [`PlanExecutionController`] – the dispatch/arrival state machine.
//!
//! ```text
//!             activate                 dispatch ok
//!   Dormant ────────────▶ Dispatching ─────────────▶ AwaitingArrival ◀─┐
//!      ▲                       │                          │   │        │
//!      │       deactivate      │                          │   └────────┘
//!      └───────────────────────┴──────────────────────────┘  arrived: advance
//!                                                            + dispatch
//!
//!   AwaitingArrival ── dispatch error after arrival ──▶ Dispatching
//!   any state ── synthesis-fatal error ──▶ Faulted (latched)
//! ```
//!
//! | State | Pose update | Activation `true` | Activation `false` |
//! |---|---|---|---|
//! | `Dormant` | ignored | dispatch current target | no-op |
//! | `Dispatching` | ignored | no-op | → `Dormant` |
//! | `AwaitingArrival` | evaluate arrival; on arrival advance and dispatch | no-op | → `Dormant` |
//! | `Faulted` | ignored | ignored | ignored |
//!
//! Activation is edge-triggered: repeating the current value does nothing.
//! Re-activation re-dispatches the synthesizer's current target without
//! advancing it.  Deactivation never cancels the in-flight goal.
//!
//! All state lives behind one [`Mutex`]; each decision and the writes that
//! follow from it (advance, dispatch, replace the active goal) happen under a
//! single lock acquisition.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use ltlnav_perception::{ArrivalErrors, ArrivalEvaluator};
use ltlnav_types::{NavError, NavigationGoal, PlannedMove, PoseEstimate};
use tracing::{debug, error, info, warn};

use crate::dispatcher::{ActiveGoal, GoalDispatcher};
use crate::goal::GoalTranslator;
use crate::synthesizer::Synthesizer;

// ─────────────────────────────────────────────────────────────────────────────
// Public types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Inactive; pose updates are ignored.
    Dormant,
    /// Active, but the current target has not been accepted by the server.
    Dispatching,
    /// A goal is in flight and pose updates are checked against it.
    AwaitingArrival,
    /// The synthesizer failed; no further goals will be sent.
    Faulted,
}

/// Result of [`PlanExecutionController::set_active`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// Same value as before; nothing happened.
    Unchanged,
    /// Activated and the current target was dispatched.
    Dispatched(NavigationGoal),
    Deactivated,
    /// The controller is faulted and ignores activation.
    Faulted,
}

/// Result of [`PlanExecutionController::on_pose`].
#[derive(Debug, Clone, PartialEq)]
pub enum PoseOutcome {
    /// Not awaiting arrival; the update had no effect.
    Ignored,
    /// Still outside tolerance of the active goal.
    EnRoute(ArrivalErrors),
    /// The active goal was reached and the next one dispatched.
    Advanced(NavigationGoal),
}

/// Snapshot of the controller for operator display.
#[derive(Debug, Clone)]
pub struct ControllerStatus {
    pub state: ControllerState,
    pub active: bool,
    pub active_goal: Option<ActiveGoal>,
    pub next_move: PlannedMove,
    /// Time since the current activation, if ever activated.
    pub epoch_elapsed: Option<Duration>,
    pub fault: Option<NavError>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

struct Inner {
    state: ControllerState,
    active: bool,
    synthesizer: Box<dyn Synthesizer>,
    dispatcher: GoalDispatcher,
    epoch: Option<Instant>,
    fault: Option<NavError>,
}

/// Top-level plan execution state machine.  Share it behind an `Arc`.
pub struct PlanExecutionController {
    inner: Mutex<Inner>,
}

impl PlanExecutionController {
    /// Build a dormant controller.  `synthesizer` must already hold a
    /// synthesized run.
    pub fn new(synthesizer: Box<dyn Synthesizer>, dispatcher: GoalDispatcher) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ControllerState::Dormant,
                active: false,
                synthesizer,
                dispatcher,
                epoch: None,
                fault: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply an activation-flag update.
    ///
    /// A dispatch failure on activation leaves the controller in
    /// `Dispatching`; toggling the flag off and on again retries.
    pub fn set_active(&self, active: bool) -> Result<ActivationOutcome, NavError> {
        let mut inner = self.lock();
        if inner.state == ControllerState::Faulted {
            debug!(active, "controller faulted, ignoring activation");
            return Ok(ActivationOutcome::Faulted);
        }
        if inner.active == active {
            return Ok(ActivationOutcome::Unchanged);
        }
        inner.active = active;

        if !active {
            inner.state = ControllerState::Dormant;
            info!("planner deactivated; in-flight goal left running");
            return Ok(ActivationOutcome::Deactivated);
        }

        inner.state = ControllerState::Dispatching;
        inner.epoch = Some(Instant::now());
        let target = inner.synthesizer.next_move();
        info!(sequence_id = target.progress_index, "planner activated");
        let goal = inner.dispatch(target)?;
        inner.state = ControllerState::AwaitingArrival;
        Ok(ActivationOutcome::Dispatched(goal))
    }

    /// Handle a pose estimate from localization.
    ///
    /// Synthesis-fatal errors latch the controller in `Faulted` before being
    /// returned.  A transport error on the follow-up dispatch drops back to
    /// `Dispatching`: the cursor has already moved on, so poses are ignored
    /// until re-activating sends the new target.
    pub fn on_pose(&self, estimate: &PoseEstimate) -> Result<PoseOutcome, NavError> {
        let mut inner = self.lock();
        if inner.state != ControllerState::AwaitingArrival {
            return Ok(PoseOutcome::Ignored);
        }
        let Some(active) = inner.dispatcher.current() else {
            return Ok(PoseOutcome::Ignored);
        };
        let sequence_id = active.sequence_id();
        let errors = ArrivalEvaluator::errors(&estimate.pose, active.waypoint());
        if !errors.within_tolerance() {
            debug!(
                sequence_id,
                position_error = errors.position,
                orientation_error = errors.orientation,
                "en route"
            );
            return Ok(PoseOutcome::EnRoute(errors));
        }

        info!(sequence_id, "goal reached");
        let next = match inner.synthesizer.advance_on_arrival() {
            Ok(next) => next,
            Err(e) => {
                if e.is_synthesis_fatal() {
                    inner.latch_fault(e.clone());
                }
                return Err(e);
            }
        };
        match inner.dispatch(next) {
            Ok(goal) => Ok(PoseOutcome::Advanced(goal)),
            Err(e) => {
                inner.state = ControllerState::Dispatching;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> ControllerState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn active_goal(&self) -> Option<ActiveGoal> {
        self.lock().dispatcher.current().cloned()
    }

    pub fn status(&self) -> ControllerStatus {
        let inner = self.lock();
        ControllerStatus {
            state: inner.state,
            active: inner.active,
            active_goal: inner.dispatcher.current().cloned(),
            next_move: inner.synthesizer.next_move(),
            epoch_elapsed: inner.epoch.map(|t| t.elapsed()),
            fault: inner.fault.clone(),
        }
    }
}

impl Inner {
    fn dispatch(&mut self, target: PlannedMove) -> Result<NavigationGoal, NavError> {
        let elapsed = self.epoch.map(|t| t.elapsed()).unwrap_or_default();
        let goal = GoalTranslator::to_goal(&target.waypoint, target.progress_index, Utc::now(), elapsed);
        if let Err(e) = self.dispatcher.send(goal.clone()) {
            warn!(sequence_id = goal.sequence_id, error = %e, "goal dispatch failed");
            return Err(e);
        }
        info!(
            sequence_id = goal.sequence_id,
            x = goal.pose.position.x,
            y = goal.pose.position.y,
            elapsed_s = elapsed.as_secs_f64(),
            "dispatched navigation goal"
        );
        Ok(goal)
    }

    fn latch_fault(&mut self, fault: NavError) {
        error!(error = %fault, "synthesis failed; plan execution halted");
        self.state = ControllerState::Faulted;
        self.fault = Some(fault);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

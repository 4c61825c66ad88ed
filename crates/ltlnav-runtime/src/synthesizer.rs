//! The plan-synthesizer seam and a replaying implementation.
//!
//! A [`Synthesizer`] turns a [`TaskSpec`] into a prefix/suffix [`Run`] and
//! then answers "where next?" as the robot makes progress.  Real temporal
//! logic synthesis lives outside this workspace; [`ReplaySynthesizer`] replays
//! a run computed offline and stored as a TOML plan file:
//!
//! ```toml
//! # Tasks the plan was computed for.  Optional; when present a request for
//! # different tasks is rejected.
//! hard_task = "<>(r1 && <>(r2 && <>r3))"
//! soft_task = ""
//!
//! [[prefix]]
//! position = { x = 0.0, y = 0.0, z = 0.0 }
//!
//! [[suffix]]
//! position = { x = 1.0, y = 0.0, z = 0.0 }
//! orientation = { x = 0.0, y = 0.0, z = 0.0, w = 1.0 }
//! ```

use std::path::Path;

use ltlnav_types::{NavError, PlannedMove, Run, TaskKind, TaskSpec, Waypoint};
use serde::Deserialize;
use tracing::{debug, info};

use crate::plan_cursor::PlanCursor;

/// Interface to the temporal-logic planner.
///
/// # Contract
///
/// * `synthesize` – produce the run for `task`.  Unsatisfiable tasks are
///   reported as [`NavError::Unsatisfiable`].
/// * `next_move` – the waypoint the robot should currently head to, tagged
///   with a progress index.  Stable until the next `advance_on_arrival`.
/// * `advance_on_arrival` – record that the current move was reached and
///   return the next one, or [`NavError::NoMoreMoves`] when none is valid.
pub trait Synthesizer: Send {
    fn synthesize(&mut self, task: &TaskSpec) -> Result<Run, NavError>;

    fn next_move(&self) -> PlannedMove;

    fn advance_on_arrival(&mut self) -> Result<PlannedMove, NavError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Plan file
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    hard_task: Option<String>,
    #[serde(default)]
    soft_task: Option<String>,
    #[serde(default)]
    prefix: Vec<Waypoint>,
    #[serde(default)]
    suffix: Vec<Waypoint>,
}

// ────────────────────────────────────────────────────────────────────────────
// ReplaySynthesizer
// ────────────────────────────────────────────────────────────────────────────

/// Replays a precomputed [`Run`] through a [`PlanCursor`].
#[derive(Debug)]
pub struct ReplaySynthesizer {
    run: Run,
    hard_task: Option<String>,
    soft_task: Option<String>,
    cursor: PlanCursor,
    synthesized: bool,
}

impl ReplaySynthesizer {
    /// Replay `run` for any task.
    pub fn new(run: Run) -> Self {
        Self {
            cursor: PlanCursor::new(run.clone()),
            run,
            hard_task: None,
            soft_task: None,
            synthesized: false,
        }
    }

    /// Only accept requests for exactly these tasks.
    pub fn with_tasks(mut self, hard_task: impl Into<String>, soft_task: impl Into<String>) -> Self {
        self.hard_task = Some(hard_task.into());
        self.soft_task = Some(soft_task.into());
        self
    }

    /// Parse a TOML plan file body.
    pub fn from_toml_str(text: &str) -> Result<Self, NavError> {
        let file: PlanFile = toml::from_str(text).map_err(|e| NavError::Plan(e.to_string()))?;
        let run = Run::new(file.prefix, file.suffix)?;
        let mut synth = Self::new(run);
        synth.hard_task = file.hard_task;
        synth.soft_task = file.soft_task;
        Ok(synth)
    }

    /// Load a TOML plan file from disk.
    pub fn from_path(path: &Path) -> Result<Self, NavError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| NavError::Plan(format!("cannot read {}: {e}", path.display())))?;
        let synth = Self::from_toml_str(&text)?;
        info!(
            path = %path.display(),
            prefix = synth.run.prefix().len(),
            suffix = synth.run.suffix().len(),
            "loaded plan file"
        );
        Ok(synth)
    }

    /// The tasks this plan was computed for, if recorded.
    pub fn plan_tasks(&self) -> (Option<&str>, Option<&str>) {
        (self.hard_task.as_deref(), self.soft_task.as_deref())
    }

    fn check_task(kind: TaskKind, expected: Option<&str>, received: &str) -> Result<(), NavError> {
        match expected {
            Some(expected) if expected.trim() != received.trim() => Err(NavError::TaskMismatch {
                kind,
                expected: expected.to_string(),
                received: received.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl Synthesizer for ReplaySynthesizer {
    fn synthesize(&mut self, task: &TaskSpec) -> Result<Run, NavError> {
        if task.hard_task.trim().is_empty() {
            return Err(NavError::Unsatisfiable("hard task is empty".into()));
        }
        Self::check_task(TaskKind::Hard, self.hard_task.as_deref(), &task.hard_task)?;
        Self::check_task(TaskKind::Soft, self.soft_task.as_deref(), &task.soft_task)?;

        if self.synthesized {
            self.cursor.reset(self.run.clone());
        }
        self.synthesized = true;
        debug!(hard = %task.hard_task, soft = %task.soft_task, "replaying stored run");
        Ok(self.run.clone())
    }

    fn next_move(&self) -> PlannedMove {
        PlannedMove {
            waypoint: *self.cursor.current(),
            progress_index: self.cursor.sequence_id(),
        }
    }

    fn advance_on_arrival(&mut self) -> Result<PlannedMove, NavError> {
        self.cursor.advance();
        Ok(self.next_move())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltlnav_types::{Pose, Position};
    use std::io::Write;

    const PLAN: &str = r#"
hard_task = "<>r1"
soft_task = ""

[[prefix]]
position = { x = 0.0, y = 0.0, z = 0.0 }

[[suffix]]
position = { x = 1.0, y = 0.0, z = 0.0 }

[[suffix]]
position = { x = 2.0, y = 0.0, z = 0.0 }
orientation = { x = 0.0, y = 0.0, z = 1.0, w = 0.0 }
"#;

    fn task(hard: &str, soft: &str) -> TaskSpec {
        TaskSpec {
            hard_task: hard.into(),
            soft_task: soft.into(),
            initial_pose: Some(Pose::default()),
        }
    }

    #[test]
    fn parses_plan_file() {
        let synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        assert_eq!(synth.plan_tasks(), (Some("<>r1"), Some("")));
        assert_eq!(synth.run.prefix().len(), 1);
        assert_eq!(synth.run.suffix()[1].orientation.z, 1.0);
    }

    #[test]
    fn plan_without_suffix_is_rejected() {
        let text = "[[prefix]]\nposition = { x = 0.0, y = 0.0, z = 0.0 }\n";
        assert_eq!(
            ReplaySynthesizer::from_toml_str(text).unwrap_err(),
            NavError::EmptySuffix
        );
    }

    #[test]
    fn malformed_plan_is_a_plan_error() {
        let err = ReplaySynthesizer::from_toml_str("suffix = 3").unwrap_err();
        assert!(matches!(err, NavError::Plan(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();
        let synth = ReplaySynthesizer::from_path(file.path()).unwrap();
        assert_eq!(synth.run.suffix().len(), 2);
    }

    #[test]
    fn missing_file_is_a_plan_error() {
        let err = ReplaySynthesizer::from_path(Path::new("/nonexistent/plan.toml")).unwrap_err();
        assert!(matches!(err, NavError::Plan(_)));
    }

    #[test]
    fn empty_hard_task_is_unsatisfiable() {
        let mut synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        let err = synth.synthesize(&task("  ", "")).unwrap_err();
        assert!(matches!(err, NavError::Unsatisfiable(_)));
        assert!(err.is_synthesis_fatal());
    }

    #[test]
    fn mismatched_task_is_rejected() {
        let mut synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        let err = synth.synthesize(&task("<>r2", "")).unwrap_err();
        assert_eq!(
            err,
            NavError::TaskMismatch {
                kind: TaskKind::Hard,
                expected: "<>r1".into(),
                received: "<>r2".into(),
            }
        );
    }

    #[test]
    fn unconstrained_plan_accepts_any_task() {
        let run = Run::new(vec![], vec![Pose::default()]).unwrap();
        let mut synth = ReplaySynthesizer::new(run.clone());
        assert_eq!(synth.synthesize(&task("[]<>r7", "<>r1")).unwrap(), run);
    }

    #[test]
    fn moves_follow_the_run() {
        let mut synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        synth.synthesize(&task("<>r1", "")).unwrap();

        let first = synth.next_move();
        assert_eq!(first.waypoint.position, Position::new(0.0, 0.0, 0.0));
        assert_eq!(first.progress_index, 0);

        let xs: Vec<f64> = (0..4)
            .map(|_| synth.advance_on_arrival().unwrap().waypoint.position.x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(synth.next_move().progress_index, 4);
    }

    #[test]
    fn next_move_is_stable_between_arrivals() {
        let mut synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        synth.synthesize(&task("<>r1", "")).unwrap();
        synth.advance_on_arrival().unwrap();
        assert_eq!(synth.next_move(), synth.next_move());
    }

    #[test]
    fn resynthesis_restarts_run_with_fresh_progress_index() {
        let mut synth = ReplaySynthesizer::from_toml_str(PLAN).unwrap();
        synth.synthesize(&task("<>r1", "")).unwrap();
        synth.advance_on_arrival().unwrap();
        synth.advance_on_arrival().unwrap();
        let before = synth.next_move().progress_index;

        synth.synthesize(&task("<>r1", "")).unwrap();
        let restarted = synth.next_move();
        assert_eq!(restarted.waypoint.position.x, 0.0);
        assert!(restarted.progress_index > before);
    }
}

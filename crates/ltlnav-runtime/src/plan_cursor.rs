//! [`PlanCursor`] – walks a [`Run`] as prefix-then-infinite-suffix.
//!
//! The cursor starts on the first prefix waypoint (or the first suffix
//! waypoint when the prefix is empty).  Each [`advance`][PlanCursor::advance]
//! moves one step along
//!
//! ```text
//! prefix[0] … prefix[n-1] suffix[0] … suffix[m-1] suffix[0] … suffix[m-1] …
//! ```
//!
//! so `advance` called `len(prefix) + k·len(suffix) + j` times lands on
//! `suffix[j]`.  Once the cursor enters the suffix it never goes back to the
//! prefix.
//!
//! # Example
//!
//! ```rust
//! use ltlnav_runtime::plan_cursor::{CursorPhase, PlanCursor};
//! use ltlnav_types::{Pose, Position, Quaternion, Run};
//!
//! let wp = |x| Pose::new(Position::new(x, 0.0, 0.0), Quaternion::identity());
//! let run = Run::new(vec![wp(0.0)], vec![wp(1.0), wp(2.0)]).unwrap();
//! let mut cursor = PlanCursor::new(run);
//!
//! assert_eq!(cursor.current().position.x, 0.0);
//! assert_eq!(cursor.advance().position.x, 1.0);
//! assert_eq!(cursor.advance().position.x, 2.0);
//! assert_eq!(cursor.advance().position.x, 1.0); // wrapped
//! assert_eq!(cursor.phase(), CursorPhase::Suffix);
//! assert_eq!(cursor.sequence_id(), 3);
//! ```

use ltlnav_types::{Run, Waypoint};

/// Which part of the run the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// Consuming the once-through prefix.
    Prefix,
    /// Cycling the suffix.
    Suffix,
}

/// Position within a [`Run`] plus a goal sequence counter.
#[derive(Debug, Clone)]
pub struct PlanCursor {
    run: Run,
    phase: CursorPhase,
    /// Index into the prefix or the suffix, depending on `phase`.
    offset: usize,
    /// Strictly increasing, one per advance.  Never reset.
    sequence_id: u64,
}

impl PlanCursor {
    /// Place a cursor on the first waypoint of `run`.
    pub fn new(run: Run) -> Self {
        let phase = Self::start_phase(&run);
        Self {
            run,
            phase,
            offset: 0,
            sequence_id: 0,
        }
    }

    fn start_phase(run: &Run) -> CursorPhase {
        if run.prefix().is_empty() {
            CursorPhase::Suffix
        } else {
            CursorPhase::Prefix
        }
    }

    /// The waypoint the cursor points at.
    pub fn current(&self) -> &Waypoint {
        match self.phase {
            CursorPhase::Prefix => &self.run.prefix()[self.offset],
            CursorPhase::Suffix => &self.run.suffix()[self.offset],
        }
    }

    /// Sequence id of the current waypoint.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn phase(&self) -> CursorPhase {
        self.phase
    }

    /// Step to the next waypoint and return it.
    pub fn advance(&mut self) -> &Waypoint {
        self.sequence_id += 1;
        match self.phase {
            CursorPhase::Prefix if self.offset + 1 < self.run.prefix().len() => {
                self.offset += 1;
            }
            CursorPhase::Prefix => {
                self.phase = CursorPhase::Suffix;
                self.offset = 0;
            }
            CursorPhase::Suffix => {
                self.offset = (self.offset + 1) % self.run.suffix().len();
            }
        }
        self.current()
    }

    /// Start over on a freshly synthesized `run`.
    ///
    /// The phase goes back to the beginning of the new run, but the sequence
    /// counter keeps counting so goal tags stay unique across syntheses.
    pub fn reset(&mut self, run: Run) {
        self.phase = Self::start_phase(&run);
        self.run = run;
        self.offset = 0;
        self.sequence_id += 1;
    }
}

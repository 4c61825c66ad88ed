//! Single in-flight goal ownership.
//!
//! [`GoalDispatcher`] hands goals to a [`NavigationClient`] under a
//! **fire-and-forget supersede** policy: the previous goal is never cancelled,
//! a new send simply replaces it as the [`ActiveGoal`].

use std::sync::Arc;
use std::time::Instant;

use ltlnav_middleware::NavigationClient;
use ltlnav_types::{NavError, NavigationGoal, Waypoint};
use tracing::debug;

/// The goal most recently accepted by the navigation client.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGoal {
    pub goal: NavigationGoal,
    pub sent_at: Instant,
}

impl ActiveGoal {
    pub fn waypoint(&self) -> &Waypoint {
        &self.goal.pose
    }

    pub fn sequence_id(&self) -> u64 {
        self.goal.sequence_id
    }
}

/// Owns at most one [`ActiveGoal`].
pub struct GoalDispatcher {
    client: Arc<dyn NavigationClient>,
    active: Option<ActiveGoal>,
}

impl GoalDispatcher {
    pub fn new(client: Arc<dyn NavigationClient>) -> Self {
        Self {
            client,
            active: None,
        }
    }

    /// Forward `goal` to the navigation client and make it the active goal.
    ///
    /// On a transport error the previous active goal is left in place and the
    /// error is returned.
    pub fn send(&mut self, goal: NavigationGoal) -> Result<(), NavError> {
        self.client.send_goal(&goal)?;
        if let Some(previous) = &self.active {
            debug!(
                superseded = previous.sequence_id(),
                sequence_id = goal.sequence_id,
                "superseding in-flight goal"
            );
        }
        self.active = Some(ActiveGoal {
            goal,
            sent_at: Instant::now(),
        });
        Ok(())
    }

    pub fn current(&self) -> Option<&ActiveGoal> {
        self.active.as_ref()
    }
}

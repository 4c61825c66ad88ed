//! The navigation-controller adapter seam.
//!
//! The execution core never speaks to a motion controller directly.  It hands
//! each [`NavigationGoal`] to a [`NavigationClient`], and the client
//! translates it into whatever protocol the controller speaks (a `move_base`
//! action goal, a Nav2 `NavigateToPose` request, a simulator call, …).
//!
//! - [`MoveBaseAdapter`][crate::move_base::MoveBaseAdapter] – publishes goals
//!   on the [`EventBus`][crate::bus::EventBus] in the `move_base` goal shape.

use async_trait::async_trait;
use ltlnav_types::{NavError, NavigationGoal};

/// Every navigation-controller binding must implement this trait.
///
/// # Contract
///
/// * `wait_for_server` – resolves once the controller accepts goals.  It may
///   wait forever; callers bound it with a timeout.
///
/// * `send_goal` – hands a goal over and returns immediately.  It never waits
///   for the robot to arrive, and a goal sent while another is still being
///   executed supersedes it without an explicit cancel.
#[async_trait]
pub trait NavigationClient: Send + Sync {
    /// Wait until the navigation controller is ready to accept goals.
    async fn wait_for_server(&self) -> Result<(), NavError>;

    /// Forward `goal` to the controller, fire-and-forget.
    fn send_goal(&self, goal: &NavigationGoal) -> Result<(), NavError>;
}

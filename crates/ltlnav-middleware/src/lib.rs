//! `ltlnav-middleware` – transport between the execution core and the robot.
//!
//! Routes asynchronous data between localization, the operator GUI, the
//! execution core and the navigation controller without caring about its
//! meaning.
//!
//! # Modules
//!
//! - [`bus`] – typed, topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels.
//! - [`adapter`] – the [`NavigationClient`] trait every navigation controller
//!   binding implements.
//! - [`move_base`] – [`MoveBaseAdapter`]: a bus-backed goal channel in the
//!   shape of a `move_base` action client.
//! - [`sim`] – [`SimulatedBase`]: a headless robot that "drives" to every goal
//!   it receives and reports the resulting pose.

pub mod adapter;
pub mod bus;
pub mod move_base;
pub mod sim;

pub use adapter::NavigationClient;
pub use bus::{EventBus, Topic, TopicReceiver};
pub use move_base::MoveBaseAdapter;
pub use sim::SimulatedBase;

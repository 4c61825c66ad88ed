//! `ltlnav-perception` – pose geometry and arrival detection.
//!
//! Turns raw pose estimates into the two error figures the execution core
//! reasons about.
//!
//! # Modules
//!
//! - [`geometry`] – [`EulerAngles`][geometry::EulerAngles] decomposition of
//!   unit quaternions (static x-y-z axes) and 3-D distances.
//! - [`arrival`] – [`ArrivalEvaluator`][arrival::ArrivalEvaluator]: the fixed
//!   tolerance policy that decides whether the robot has reached a dispatched
//!   waypoint.

pub mod arrival;
pub mod geometry;

pub use arrival::{ArrivalErrors, ArrivalEvaluator, ORIENTATION_TOLERANCE_RAD, POSITION_TOLERANCE_M};
pub use geometry::{EulerAngles, distance};

//! Status propagation - recomputes need and plan statuses after writes.

mod clock;
mod status_propagation;
mod status_rules;

pub use clock::{Clock, FixedClock, SystemClock};
pub use status_propagation::StatusPropagationEngine;
pub use status_rules::{derive_need_status, derive_plan_status};

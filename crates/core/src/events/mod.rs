//! Domain events module.
//!
//! Services emit these events after a successful write. The status
//! propagation engine is the production sink; tests substitute the no-op or
//! collecting sinks.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;

//! Needs module - items a school requires under one or more plans.

mod needs_model;
mod needs_service;
mod needs_traits;

pub use needs_model::{Need, NeedFilter, NeedStatus, NeedSummary, NeedUpdate, NewNeed};
pub use needs_service::NeedService;
pub use needs_traits::{NeedRepositoryTrait, NeedServiceTrait};

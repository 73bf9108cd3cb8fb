//! Plans module - annual improvement plans, the aggregate root.

mod plans_model;
mod plans_service;
mod plans_traits;
mod school_year;

pub use plans_model::{NewPlan, Plan, PlanFilter, PlanStatus, PlanUpdate};
pub use plans_service::PlanService;
pub use plans_traits::{PlanRepositoryTrait, PlanServiceTrait};
pub use school_year::SchoolYear;

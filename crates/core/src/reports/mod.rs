//! Reports module - stored parameterized queries run against named collections.

mod binding;
mod collections;
mod filter;
mod pipeline;
mod reports_model;
mod reports_service;
mod reports_traits;

pub use binding::{bind_step, bind_value, resolve_params};
pub use collections::{
    CollectionRegistry, CollectionSource, ContributionCollection, NeedCollection, PlanCollection,
};
pub use filter::matches;
pub use pipeline::execute_step;
pub use reports_model::{
    Accumulator, AggregateStep, CountStep, FindStep, GroupStage, NewReportDefinition,
    NewReportQuery, ParamSpec, ParamType, PopulateSpec, QueryStep, ReportDefinition,
    ReportOutput, ReportQuery, SortDirection, SortKey, Stage,
};
pub use reports_service::ReportService;
pub use reports_traits::{ReportRepositoryTrait, ReportServiceTrait};

//! Pure status derivation rules.

use chrono::NaiveDate;
use rust_decimal::prelude::*;

use crate::needs::NeedStatus;
use crate::plans::{PlanStatus, SchoolYear};

/// Derives a need's status from the total contributed quantity.
///
/// `target` must be positive. Over-fulfillment counts as `Completed`; partial
/// fulfillment is reported as a percentage rounded half up.
pub fn derive_need_status(fulfilled: f64, target: f64) -> NeedStatus {
    if fulfilled <= 0.0 {
        return NeedStatus::LookingForPartner;
    }
    if fulfilled >= target {
        return NeedStatus::Completed;
    }
    NeedStatus::PercentComplete(percent_half_up(fulfilled, target))
}

fn percent_half_up(fulfilled: f64, target: f64) -> u32 {
    match (Decimal::from_f64(fulfilled), Decimal::from_f64(target)) {
        (Some(f), Some(t)) if !t.is_zero() => (f * Decimal::ONE_HUNDRED / t)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0),
        _ => (100.0 * fulfilled / target).round() as u32,
    }
}

/// Derives a plan's status from the statuses of its needs.
///
/// Rules, first match wins:
/// - no needs: `Created`
/// - year ended and nothing completed: `Unimplemented`
/// - year ended and some but not all completed: `Incomplete`
/// - everything completed: `Completed`
/// - otherwise: `Ongoing`
pub fn derive_plan_status(
    need_statuses: &[NeedStatus],
    school_year: &SchoolYear,
    today: NaiveDate,
) -> PlanStatus {
    let total = need_statuses.len();
    if total == 0 {
        return PlanStatus::Created;
    }
    let completed = need_statuses.iter().filter(|s| s.is_completed()).count();
    let ended = school_year.has_ended(today);

    if ended && completed == 0 {
        PlanStatus::Unimplemented
    } else if ended && completed < total {
        PlanStatus::Incomplete
    } else if completed == total {
        PlanStatus::Completed
    } else {
        PlanStatus::Ongoing
    }
}

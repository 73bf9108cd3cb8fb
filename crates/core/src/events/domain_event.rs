//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about data changes inside one partition.
/// The status propagation engine turns them into need and plan
/// recomputations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A contribution was created, updated, or deleted under this need.
    ContributionWritten { need_id: String },

    /// A need was created, updated, or deleted.
    NeedWritten {
        need_id: String,
        /// Plans the need references now plus any it was detached from.
        plan_ids: Vec<String>,
    },

    /// A plan's school year changed, which moves its end date.
    PlanScheduleChanged { plan_id: String },
}

impl DomainEvent {
    /// Creates a ContributionWritten event.
    pub fn contribution_written(need_id: impl Into<String>) -> Self {
        Self::ContributionWritten {
            need_id: need_id.into(),
        }
    }

    /// Creates a NeedWritten event with deduplicated plan ids.
    pub fn need_written(need_id: impl Into<String>, plan_ids: Vec<String>) -> Self {
        let mut plan_ids = plan_ids;
        plan_ids.sort();
        plan_ids.dedup();
        Self::NeedWritten {
            need_id: need_id.into(),
            plan_ids,
        }
    }

    /// Creates a PlanScheduleChanged event.
    pub fn plan_schedule_changed(plan_id: impl Into<String>) -> Self {
        Self::PlanScheduleChanged {
            plan_id: plan_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_event_serialization() {
        let event = DomainEvent::contribution_written("need-1");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("contribution_written"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_need_written_dedups_plans() {
        let event = DomainEvent::need_written(
            "need-1",
            vec!["p2".to_string(), "p1".to_string(), "p2".to_string()],
        );
        match event {
            DomainEvent::NeedWritten { need_id, plan_ids } => {
                assert_eq!(need_id, "need-1");
                assert_eq!(plan_ids, vec!["p1", "p2"]);
            }
            _ => panic!("Expected NeedWritten"),
        }
    }
}

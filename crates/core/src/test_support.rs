//! In-memory repositories shared by service and propagation tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::contributions::{
    Contribution, ContributionFilter, ContributionRepositoryTrait, ContributionUpdate,
    NewContribution,
};
use crate::errors::{DatabaseError, Error, Result};
use crate::needs::{Need, NeedFilter, NeedRepositoryTrait, NeedStatus, NeedUpdate, NewNeed};
use crate::plans::{NewPlan, Plan, PlanFilter, PlanRepositoryTrait, PlanStatus, PlanUpdate};
use crate::sequences::SequenceRepositoryTrait;
use crate::tenants::PartitionHandle;

type Key = (String, String);

fn key(partition: &PartitionHandle, id: &str) -> Key {
    (partition.partition_id().to_string(), id.to_string())
}

#[derive(Default)]
struct Tables {
    plans: HashMap<Key, Plan>,
    needs: HashMap<Key, Need>,
    contributions: HashMap<Key, Contribution>,
    counters: HashMap<Key, i64>,
}

/// One store backing every partition-scoped repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    status_writes: AtomicUsize,
    /// Need codes that collide on insert, to exercise retries.
    pub taken_codes: Mutex<Vec<String>>,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn seed_plan(&self, partition: &PartitionHandle, school_year: &str) -> Plan {
        let now = Utc::now().naive_utc();
        let mut tables = self.lock();
        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            sequence_number: tables.plans.len() as i64 + 1,
            school_id: "school-1".to_string(),
            school_year: school_year.to_string(),
            title: "Plan".to_string(),
            objectives: vec![],
            status: PlanStatus::Created,
            owner_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.plans.insert(key(partition, &plan.id), plan.clone());
        plan
    }

    pub fn seed_need<S: AsRef<str>>(
        &self,
        partition: &PartitionHandle,
        plan_ids: &[S],
        target_quantity: Option<f64>,
    ) -> Need {
        let now = Utc::now().naive_utc();
        let mut tables = self.lock();
        let need = Need {
            id: Uuid::new_v4().to_string(),
            code: format!("NEED-{:06}", tables.needs.len() + 1),
            plan_ids: plan_ids.iter().map(|p| p.as_ref().to_string()).collect(),
            school_id: "school-1".to_string(),
            school_year: "2024-2025".to_string(),
            title: "Need".to_string(),
            description: None,
            target_quantity,
            unit: None,
            implementation_status: NeedStatus::LookingForPartner,
            created_at: now,
            updated_at: now,
        };
        tables.needs.insert(key(partition, &need.id), need.clone());
        need
    }

    pub fn seed_contribution(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        quantity: f64,
    ) -> Contribution {
        let now = Utc::now().naive_utc();
        let contribution = Contribution {
            id: Uuid::new_v4().to_string(),
            need_id: need_id.to_string(),
            partner_id: "partner-1".to_string(),
            amount: Default::default(),
            quantity,
            unit: None,
            signing_date: None,
            start_date: None,
            end_date: None,
            school_id: "school-1".to_string(),
            school_year: "2024-2025".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .contributions
            .insert(key(partition, &contribution.id), contribution.clone());
        contribution
    }

    pub fn get_by_id_need(&self, partition: &PartitionHandle, need_id: &str) -> Need {
        self.lock().needs[&key(partition, need_id)].clone()
    }

    pub fn set_plan_status(&self, partition: &PartitionHandle, plan_id: &str, status: PlanStatus) {
        if let Some(plan) = self.lock().plans.get_mut(&key(partition, plan_id)) {
            plan.status = status;
        }
    }

    /// Number of derived-status writes performed so far.
    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanRepositoryTrait for InMemoryStore {
    fn get_by_id(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan> {
        self.lock()
            .plans
            .get(&key(partition, plan_id))
            .cloned()
            .ok_or_else(|| Error::not_found("Plan", plan_id))
    }

    fn list(&self, partition: &PartitionHandle, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .lock()
            .plans
            .iter()
            .filter(|((pid, _), _)| pid == partition.partition_id())
            .map(|(_, plan)| plan.clone())
            .filter(|p| filter.school_id.as_ref().is_none_or(|s| &p.school_id == s))
            .filter(|p| filter.school_year.as_ref().is_none_or(|y| &p.school_year == y))
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .collect();
        plans.sort_by_key(|p| p.sequence_number);
        Ok(plans)
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_plan: NewPlan,
        sequence_number: i64,
    ) -> Result<Plan> {
        let now = Utc::now().naive_utc();
        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            sequence_number,
            school_id: new_plan.school_id,
            school_year: new_plan.school_year,
            title: new_plan.title,
            objectives: new_plan.objectives,
            status: PlanStatus::Created,
            owner_id: new_plan.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .plans
            .insert(key(partition, &plan.id), plan.clone());
        Ok(plan)
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        update: PlanUpdate,
    ) -> Result<Plan> {
        let mut tables = self.lock();
        let plan = tables
            .plans
            .get_mut(&key(partition, plan_id))
            .ok_or_else(|| Error::not_found("Plan", plan_id))?;
        plan.school_year = update.school_year;
        plan.title = update.title;
        plan.objectives = update.objectives;
        plan.owner_id = update.owner_id;
        plan.updated_at = Utc::now().naive_utc();
        Ok(plan.clone())
    }

    async fn update_status(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        status: PlanStatus,
    ) -> Result<()> {
        let mut tables = self.lock();
        let plan = tables
            .plans
            .get_mut(&key(partition, plan_id))
            .ok_or_else(|| Error::not_found("Plan", plan_id))?;
        plan.status = status;
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, partition: &PartitionHandle, plan_id: &str) -> Result<usize> {
        Ok(self
            .lock()
            .plans
            .remove(&key(partition, plan_id))
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl NeedRepositoryTrait for InMemoryStore {
    fn get_by_id(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need> {
        self.lock()
            .needs
            .get(&key(partition, need_id))
            .cloned()
            .ok_or_else(|| Error::not_found("Need", need_id))
    }

    fn list(&self, partition: &PartitionHandle, filter: &NeedFilter) -> Result<Vec<Need>> {
        let mut needs: Vec<Need> = self
            .lock()
            .needs
            .iter()
            .filter(|((pid, _), _)| pid == partition.partition_id())
            .map(|(_, need)| need.clone())
            .filter(|n| filter.plan_id.as_ref().is_none_or(|p| n.plan_ids.contains(p)))
            .filter(|n| filter.school_id.as_ref().is_none_or(|s| &n.school_id == s))
            .filter(|n| filter.school_year.as_ref().is_none_or(|y| &n.school_year == y))
            .collect();
        needs.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(needs)
    }

    fn list_by_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Vec<Need>> {
        NeedRepositoryTrait::list(
            self,
            partition,
            &NeedFilter {
                plan_id: Some(plan_id.to_string()),
                ..Default::default()
            },
        )
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_need: NewNeed,
        code: String,
    ) -> Result<Need> {
        if self.taken_codes.lock().unwrap().contains(&code) {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "needs.code {}",
                code
            ))));
        }
        let now = Utc::now().naive_utc();
        let need = Need {
            id: Uuid::new_v4().to_string(),
            code,
            plan_ids: new_need.plan_ids,
            school_id: new_need.school_id.unwrap_or_default(),
            school_year: new_need.school_year.unwrap_or_default(),
            title: new_need.title,
            description: new_need.description,
            target_quantity: new_need.target_quantity,
            unit: new_need.unit,
            implementation_status: NeedStatus::LookingForPartner,
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .needs
            .insert(key(partition, &need.id), need.clone());
        Ok(need)
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        update: NeedUpdate,
    ) -> Result<Need> {
        let mut tables = self.lock();
        let need = tables
            .needs
            .get_mut(&key(partition, need_id))
            .ok_or_else(|| Error::not_found("Need", need_id))?;
        need.plan_ids = update.plan_ids;
        need.title = update.title;
        need.description = update.description;
        need.target_quantity = update.target_quantity;
        need.unit = update.unit;
        need.updated_at = Utc::now().naive_utc();
        Ok(need.clone())
    }

    async fn update_status(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        status: NeedStatus,
    ) -> Result<()> {
        let mut tables = self.lock();
        let need = tables
            .needs
            .get_mut(&key(partition, need_id))
            .ok_or_else(|| Error::not_found("Need", need_id))?;
        need.implementation_status = status;
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, partition: &PartitionHandle, need_id: &str) -> Result<usize> {
        let mut tables = self.lock();
        tables
            .contributions
            .retain(|(pid, _), c| pid != partition.partition_id() || c.need_id != need_id);
        Ok(tables
            .needs
            .remove(&key(partition, need_id))
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl ContributionRepositoryTrait for InMemoryStore {
    fn get_by_id(&self, partition: &PartitionHandle, contribution_id: &str) -> Result<Contribution> {
        self.lock()
            .contributions
            .get(&key(partition, contribution_id))
            .cloned()
            .ok_or_else(|| Error::not_found("Contribution", contribution_id))
    }

    fn list(
        &self,
        partition: &PartitionHandle,
        filter: &ContributionFilter,
    ) -> Result<Vec<Contribution>> {
        let mut contributions: Vec<Contribution> = self
            .lock()
            .contributions
            .iter()
            .filter(|((pid, _), _)| pid == partition.partition_id())
            .map(|(_, c)| c.clone())
            .filter(|c| filter.need_id.as_ref().is_none_or(|n| &c.need_id == n))
            .filter(|c| filter.partner_id.as_ref().is_none_or(|p| &c.partner_id == p))
            .filter(|c| filter.school_id.as_ref().is_none_or(|s| &c.school_id == s))
            .filter(|c| filter.school_year.as_ref().is_none_or(|y| &c.school_year == y))
            .collect();
        contributions.sort_by_key(|c| c.created_at);
        Ok(contributions)
    }

    fn sum_quantity_for_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<f64> {
        Ok(self
            .lock()
            .contributions
            .iter()
            .filter(|((pid, _), c)| pid == partition.partition_id() && c.need_id == need_id)
            .map(|(_, c)| c.quantity)
            .sum())
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_contribution: NewContribution,
        need: &Need,
    ) -> Result<Contribution> {
        let now = Utc::now().naive_utc();
        let contribution = Contribution {
            id: Uuid::new_v4().to_string(),
            need_id: new_contribution.need_id,
            partner_id: new_contribution.partner_id,
            amount: new_contribution.amount,
            quantity: new_contribution.quantity,
            unit: new_contribution.unit,
            signing_date: new_contribution.signing_date,
            start_date: new_contribution.start_date,
            end_date: new_contribution.end_date,
            school_id: need.school_id.clone(),
            school_year: need.school_year.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .contributions
            .insert(key(partition, &contribution.id), contribution.clone());
        Ok(contribution)
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
        update: ContributionUpdate,
        need: &Need,
    ) -> Result<Contribution> {
        let mut tables = self.lock();
        let c = tables
            .contributions
            .get_mut(&key(partition, contribution_id))
            .ok_or_else(|| Error::not_found("Contribution", contribution_id))?;
        c.need_id = update.need_id;
        c.partner_id = update.partner_id;
        c.amount = update.amount;
        c.quantity = update.quantity;
        c.unit = update.unit;
        c.signing_date = update.signing_date;
        c.start_date = update.start_date;
        c.end_date = update.end_date;
        c.school_id = need.school_id.clone();
        c.school_year = need.school_year.clone();
        c.updated_at = Utc::now().naive_utc();
        Ok(c.clone())
    }

    async fn delete(&self, partition: &PartitionHandle, contribution_id: &str) -> Result<usize> {
        Ok(self
            .lock()
            .contributions
            .remove(&key(partition, contribution_id))
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl SequenceRepositoryTrait for InMemoryStore {
    async fn increment(&self, partition: &PartitionHandle, counter_name: &str) -> Result<i64> {
        let mut tables = self.lock();
        let value = tables
            .counters
            .entry(key(partition, counter_name))
            .or_insert(0);
        *value += 1;
        Ok(*value)
    }

    fn current(&self, partition: &PartitionHandle, counter_name: &str) -> Result<Option<i64>> {
        Ok(self.lock().counters.get(&key(partition, counter_name)).copied())
    }
}

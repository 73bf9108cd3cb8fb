//! Named collections report queries can read from.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::contributions::{ContributionFilter, ContributionRepositoryTrait};
use crate::errors::{Error, Result};
use crate::needs::{NeedFilter, NeedRepositoryTrait};
use crate::plans::{PlanFilter, PlanRepositoryTrait};
use crate::tenants::PartitionHandle;

/// A typed entity set exposed to report queries as JSON documents.
pub trait CollectionSource: Send + Sync {
    /// Name report queries use to refer to this collection.
    fn name(&self) -> &str;

    /// Every document of the collection inside one partition.
    fn documents(&self, partition: &PartitionHandle) -> Result<Vec<Value>>;
}

fn to_documents<T: Serialize>(items: Vec<T>) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|item| serde_json::to_value(item).map_err(Error::from))
        .collect()
}

pub struct PlanCollection(pub Arc<dyn PlanRepositoryTrait>);

impl CollectionSource for PlanCollection {
    fn name(&self) -> &str {
        "plans"
    }

    fn documents(&self, partition: &PartitionHandle) -> Result<Vec<Value>> {
        to_documents(self.0.list(partition, &PlanFilter::default())?)
    }
}

pub struct NeedCollection(pub Arc<dyn NeedRepositoryTrait>);

impl CollectionSource for NeedCollection {
    fn name(&self) -> &str {
        "needs"
    }

    fn documents(&self, partition: &PartitionHandle) -> Result<Vec<Value>> {
        to_documents(self.0.list(partition, &NeedFilter::default())?)
    }
}

pub struct ContributionCollection(pub Arc<dyn ContributionRepositoryTrait>);

impl CollectionSource for ContributionCollection {
    fn name(&self) -> &str {
        "contributions"
    }

    fn documents(&self, partition: &PartitionHandle) -> Result<Vec<Value>> {
        to_documents(self.0.list(partition, &ContributionFilter::default())?)
    }
}

/// Resolves collection names to sources at run time.
#[derive(Default, Clone)]
pub struct CollectionRegistry {
    sources: BTreeMap<String, Arc<dyn CollectionSource>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the plan, need and contribution collections.
    pub fn with_defaults(
        plans: Arc<dyn PlanRepositoryTrait>,
        needs: Arc<dyn NeedRepositoryTrait>,
        contributions: Arc<dyn ContributionRepositoryTrait>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlanCollection(plans)));
        registry.register(Arc::new(NeedCollection(needs)));
        registry.register(Arc::new(ContributionCollection(contributions)));
        registry
    }

    /// Adds a source, replacing any source registered under the same name.
    pub fn register(&mut self, source: Arc<dyn CollectionSource>) {
        self.sources.insert(source.name().to_string(), source);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn CollectionSource>> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::invalid_input(format!("Unknown collection '{}'", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }
}

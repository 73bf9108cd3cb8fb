//! Static implication graph from "manage" capabilities to the "view"
//! capabilities they grant, and its transitive closure.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

/// Rules shipped with the backend: manage capability -> implied capabilities.
const DEFAULT_RULES: &[(&str, &[&str])] = &[
    ("manage_tenants", &["view_tenants"]),
    ("manage_plans", &["view_plans", "view_schools"]),
    ("manage_needs", &["view_needs", "view_plans"]),
    (
        "manage_contributions",
        &["view_contributions", "view_needs", "view_partners"],
    ),
    ("manage_partners", &["view_partners"]),
    ("manage_reports", &["view_reports"]),
    ("manage_users", &["view_users"]),
];

pub static DEFAULT_GRAPH: LazyLock<PermissionGraph> =
    LazyLock::new(|| PermissionGraph::with_rules(DEFAULT_RULES.iter().copied()));

/// Adjacency map of capability implications.
#[derive(Debug, Clone, Default)]
pub struct PermissionGraph {
    implies: HashMap<String, Vec<String>>,
}

impl PermissionGraph {
    pub fn with_rules<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let mut implies: HashMap<String, Vec<String>> = HashMap::new();
        for (capability, implied) in rules {
            implies
                .entry(capability.to_string())
                .or_default()
                .extend(implied.iter().map(|s| s.to_string()));
        }
        Self { implies }
    }

    /// Capabilities directly implied by `capability`.
    pub fn implied_by(&self, capability: &str) -> &[String] {
        self.implies
            .get(capability)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Transitive closure of `granted` under the implication graph.
    ///
    /// Works on graphs of any depth; cycles terminate because a capability is
    /// only queued the first time it is added.
    pub fn expand<'a, I>(&self, granted: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut expanded: BTreeSet<String> = BTreeSet::new();
        let mut pending: Vec<String> = Vec::new();

        for capability in granted {
            if expanded.insert(capability.clone()) {
                pending.push(capability.clone());
            }
        }

        while let Some(capability) = pending.pop() {
            for implied in self.implied_by(&capability) {
                if expanded.insert(implied.clone()) {
                    pending.push(implied.clone());
                }
            }
        }

        expanded
    }
}

/// Expands `granted` against the built-in graph.
pub fn expand<'a, I>(granted: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    DEFAULT_GRAPH.expand(granted)
}

/// True when `required` is in the expansion of `granted`.
pub fn has_permission(granted: &HashSet<String>, required: &str) -> bool {
    granted.contains(required) || expand(granted).contains(required)
}

//! Permissions module - capability implication graph and caller identity.

mod identity;
mod permission_graph;

pub use identity::CallerIdentity;
pub use permission_graph::{expand, has_permission, PermissionGraph, DEFAULT_GRAPH};

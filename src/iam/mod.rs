//! IAM policy aggregation
//!
//! Turns group-based access policy into concrete bindings and access entries.
//!
//! # Module Structure
//!
//! - [`bindings`] - Order-preserving role bindings and the per-resource aggregator
//! - [`dataset_access`] - BigQuery dataset access entries
//! - [`patch`] - Fetch-then-patch project IAM policy resource pairs

pub mod bindings;
pub mod dataset_access;
pub mod patch;

pub use bindings::{
    Binding, BindingSet, ProjectBindings, RoleBindingAggregator, BUCKET_ROLE_ALIASES,
};
pub use dataset_access::{AccessEntry, Grantee, DATASET_ACCESS_ALIASES};
pub use patch::{AuditConfig, IamPatch, IamPolicyPatchBuilder, LogType, PolicyChange};

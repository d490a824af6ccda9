//! Resource names
//!
//! Downstream consumers cache and diff deployments by resource name, so these
//! must stay stable.

/// Prefix of the project-level binding fetch/patch pair
pub const PROJECT_BINDINGS: &str = "set-project-bindings";

pub const AUDIT_SINK: &str = "audit-logs-to-bigquery";

/// Dataset the local audit sink writes into
pub const LOCAL_AUDIT_DATASET: &str = "audit_logs";

pub const AUDIT_CONFIGS_FETCH: &str = "audit-configs-get-iam-etag";
pub const AUDIT_CONFIGS_PATCH: &str = "audit-configs-patch-iam-policy";

pub fn fetch_name(prefix: &str) -> String {
    format!("{}-get-iam-policy", prefix)
}

pub fn patch_name(prefix: &str) -> String {
    format!("{}-patch-iam-policy", prefix)
}

/// Local audit logs bucket, named after the project
pub fn logs_bucket(project_id: &str) -> String {
    format!("{}-logs", project_id)
}

pub fn dataset_create(dataset: &str) -> String {
    format!("create-big-query-dataset-{}", dataset)
}

pub fn dataset_update(dataset: &str) -> String {
    format!("update-big-query-dataset-{}", dataset)
}

//! Project spec schema
//!
//! The declarative input to the compiler. Every field is optional on the wire
//! and unknown fields are ignored; [`normalize`] turns a [`ProjectSpec`] into a
//! [`NormalizedSpec`] with defaults applied and all cross-field checks done.
//!
//! # Example
//!
//! ```yaml
//! project_id: my-project
//! has_organization: true
//! owners_group: admins@example.com
//! auditors_group: auditors@example.com
//! data_readwrite_groups: [rw@example.com]
//! remote_audit_logs:
//!   audit_logs_project_id: my-audit-logs
//!   logs_gcs_bucket_name: audit-bucket
//!   logs_bigquery_dataset_id: audit_dataset
//! data_buckets:
//!   - name: my-project-data
//!     location: US
//!     storage_class: MULTI_REGIONAL
//! ```

mod normalize;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use normalize::{
    normalize, NormalizedAuditLogs, NormalizedBucket, NormalizedDataset, NormalizedSpec,
    StorageClass, DEFAULT_ACK_DEADLINE_SEC, DEFAULT_LOGS_TTL_DAYS,
};

/// Members keyed by role alias (`owners`, `readwrite`, `readonly`, ...)
pub type AliasPermissions = BTreeMap<String, Vec<String>>;

/// Raw project spec as loaded from a YAML or JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSpec {
    pub project_id: Option<String>,
    pub has_organization: bool,
    pub owners_group: Option<String>,
    pub editors_group: Option<String>,
    pub auditors_group: Option<String>,
    /// Bootstrap owner to revoke once the owners group is in place
    pub remove_owner_user: Option<String>,
    pub data_readwrite_groups: Vec<String>,
    pub data_readonly_groups: Vec<String>,
    pub additional_project_permissions: Vec<AdditionalPermission>,
    pub custom_roles: Vec<CustomRole>,
    pub bigquery_datasets: Vec<BigQueryDataset>,
    pub data_buckets: Vec<StorageBucket>,
    pub local_audit_logs: Option<LocalAuditLogs>,
    pub remote_audit_logs: Option<RemoteAuditLogs>,
    pub pubsub: Option<PubSub>,
    /// Not used by the compiler beyond logging
    pub enabled_apis: Vec<String>,
}

/// Grants every listed role to every listed member at project level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalPermission {
    pub roles: Vec<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRole {
    pub name: String,
    pub permissions: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigQueryDataset {
    pub name: String,
    pub location: String,
    pub additional_dataset_permissions: Option<AliasPermissions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageBucket {
    pub name: String,
    pub location: String,
    pub storage_class: Option<String>,
    pub additional_bucket_permissions: Option<AliasPermissions>,
    /// Users allowed to read the bucket without tripping the unexpected-access metric
    pub expected_users: Option<Vec<String>>,
}

/// Audit logs written to a bucket and dataset created inside this project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalAuditLogs {
    pub logs_gcs_bucket: LogsBucket,
    pub logs_bigquery_dataset: LogsDataset,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsBucket {
    pub location: String,
    pub storage_class: Option<String>,
    pub ttl_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsDataset {
    pub location: String,
}

/// Audit logs written to a bucket and dataset owned by a separate audit project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteAuditLogs {
    pub audit_logs_project_id: String,
    pub logs_gcs_bucket_name: String,
    pub logs_bigquery_dataset_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubSub {
    pub topic: String,
    pub subscription: String,
    pub publisher_account: String,
    pub ack_deadline_sec: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults_and_unknown_fields() {
        let yaml = r#"
owners_group: admins@example.com
auditors_group: auditors@example.com
some_future_field: ignored
data_buckets:
  - name: b1
    location: US
    additional_bucket_permissions:
      readonly: [allUsers]
"#;
        let spec: ProjectSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(!spec.has_organization);
        assert!(spec.data_readwrite_groups.is_empty());
        assert_eq!(spec.data_buckets.len(), 1);
        assert_eq!(spec.data_buckets[0].storage_class, None);
        assert_eq!(
            spec.data_buckets[0]
                .additional_bucket_permissions
                .as_ref()
                .unwrap()["readonly"],
            vec!["allUsers".to_string()]
        );
        assert!(spec.local_audit_logs.is_none());
    }

    #[test]
    fn test_json_local_audit_logs() {
        let json = r#"{
            "local_audit_logs": {
                "logs_gcs_bucket": {"location": "US", "ttl_days": 30},
                "logs_bigquery_dataset": {"location": "US"}
            }
        }"#;
        let spec: ProjectSpec = serde_json::from_str(json).unwrap();
        let local = spec.local_audit_logs.unwrap();
        assert_eq!(local.logs_gcs_bucket.ttl_days, Some(30));
        assert_eq!(local.logs_bigquery_dataset.location, "US");
    }
}

//! Audit logging destinations
//!
//! Audit logs go either to a bucket and dataset created in this project
//! (local) or to ones owned by a central audit project (remote). Conflicting
//! configuration is rejected during normalization, so a normalized spec
//! resolves to at most one destination.

use crate::iam::RoleBindingAggregator;
use crate::resource::{names, types, Resource};
use crate::spec::{NormalizedAuditLogs, NormalizedSpec};
use serde_json::json;

const AUDIT_LOG_FILTER: &str = r#"logName:"logs/cloudaudit.googleapis.com""#;

/// Where audit logs end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditDestination {
    Local {
        bucket_name: String,
        dataset_name: String,
    },
    Remote {
        project_id: String,
        bucket_name: String,
        dataset_name: String,
    },
}

impl AuditDestination {
    pub fn bucket_name(&self) -> &str {
        match self {
            Self::Local { bucket_name, .. } | Self::Remote { bucket_name, .. } => bucket_name,
        }
    }

    pub fn dataset_name(&self) -> &str {
        match self {
            Self::Local { dataset_name, .. } | Self::Remote { dataset_name, .. } => dataset_name,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// BigQuery sink destination URI
    pub fn sink_destination(&self, current_project: &str) -> String {
        let project = match self {
            Self::Local { .. } => current_project,
            Self::Remote { project_id, .. } => project_id,
        };
        format!(
            "bigquery.googleapis.com/projects/{}/datasets/{}",
            project,
            self.dataset_name()
        )
    }
}

/// Resolved audit logging: destination, resources it needs, and the sink
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAuditLogs {
    pub destination: AuditDestination,
    /// Destination resources created in this project; empty for remote logs
    pub resources: Vec<Resource>,
    pub sink: Resource,
}

impl ResolvedAuditLogs {
    /// Resource the first data bucket must wait for, if any
    pub fn logs_bucket_resource(&self) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.type_or_action == types::STORAGE_BUCKET)
            .map(|r| r.name.as_str())
    }

    /// Destination resources followed by the sink
    pub fn into_resources(self) -> Vec<Resource> {
        let mut resources = self.resources;
        resources.push(self.sink);
        resources
    }
}

pub struct AuditLoggingResolver<'a> {
    spec: &'a NormalizedSpec,
    bindings: &'a RoleBindingAggregator<'a>,
}

impl<'a> AuditLoggingResolver<'a> {
    pub fn new(spec: &'a NormalizedSpec, bindings: &'a RoleBindingAggregator<'a>) -> Self {
        Self { spec, bindings }
    }

    /// `None` when the spec configures no audit logs
    pub fn resolve(&self) -> Option<ResolvedAuditLogs> {
        let audit_logs = self.spec.audit_logs.as_ref()?;
        let project_id = &self.spec.project_id;

        let (destination, resources) = match audit_logs {
            NormalizedAuditLogs::Local {
                bucket_location,
                bucket_storage_class,
                ttl_days,
                ..
            } => {
                let bucket_name = names::logs_bucket(project_id);
                let bucket = Resource::create(
                    &bucket_name,
                    types::STORAGE_BUCKET,
                    json!({
                        "location": bucket_location,
                        "storageClass": bucket_storage_class.as_str(),
                        "lifecycle": {
                            "rule": [{
                                "action": {"type": "Delete"},
                                "condition": {"isLive": true, "age": ttl_days},
                            }],
                        },
                    }),
                )
                .with_bindings(self.bindings.logs_bucket_bindings());
                let destination = AuditDestination::Local {
                    bucket_name,
                    dataset_name: names::LOCAL_AUDIT_DATASET.to_string(),
                };
                (destination, vec![bucket])
            }
            NormalizedAuditLogs::Remote {
                project_id,
                bucket_name,
                dataset_name,
            } => {
                let destination = AuditDestination::Remote {
                    project_id: project_id.clone(),
                    bucket_name: bucket_name.clone(),
                    dataset_name: dataset_name.clone(),
                };
                (destination, Vec::new())
            }
        };

        let sink = Resource::create(
            names::AUDIT_SINK,
            types::LOGGING_SINK,
            json!({
                "sink": names::AUDIT_SINK,
                "uniqueWriterIdentity": true,
                "destination": destination.sink_destination(project_id),
                "filter": AUDIT_LOG_FILTER,
            }),
        );

        tracing::info!(
            "Audit logs for {} resolved to {} bucket {}",
            project_id,
            if destination.is_local() { "local" } else { "remote" },
            destination.bucket_name()
        );

        Some(ResolvedAuditLogs {
            destination,
            resources,
            sink,
        })
    }
}

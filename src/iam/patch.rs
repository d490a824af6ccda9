//! Project IAM policy patches
//!
//! Project policies are never overwritten. Each mutation is a pair of
//! resources: an action that fetches the live policy on every run, and an
//! action that applies a change against that fetched policy, referencing its
//! etag so a concurrent modification fails the patch instead of being lost.
//! The provisioning engine retries the pair on etag mismatch.

use super::Binding;
use crate::resource::{names, types, Resource, RuntimePolicy};
use serde::Serialize;
use serde_json::json;

/// Audit log types enabled by an audit config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    AdminRead,
    DataWrite,
    DataRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct AuditLogConfig {
    #[serde(rename = "logType")]
    log_type: LogType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    audit_log_configs: Vec<AuditLogConfig>,
    service: String,
}

impl AuditConfig {
    pub fn new(service: &str, log_types: &[LogType]) -> Self {
        Self {
            audit_log_configs: log_types
                .iter()
                .map(|&log_type| AuditLogConfig { log_type })
                .collect(),
            service: service.to_string(),
        }
    }

    /// Every log type for every service
    pub fn all_services() -> Self {
        Self::new(
            "allServices",
            &[LogType::AdminRead, LogType::DataWrite, LogType::DataRead],
        )
    }
}

/// What the patch half of the pair changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyChange {
    /// Add/remove bindings on top of the fetched policy
    Bindings { add: Vec<Binding>, remove: Vec<Binding> },
    /// Replace only `auditConfigs`, guarded by the fetched etag
    AuditConfigs(Vec<AuditConfig>),
}

/// A linked fetch/patch pair against one project's IAM policy
#[derive(Debug, Clone, PartialEq)]
pub struct IamPatch {
    pub resource: String,
    pub fetch_name: String,
    pub patch_name: String,
    pub change: PolicyChange,
    /// Reference to the fetch output the patch is applied against
    pub etag_reference: String,
    /// Resources that must be applied before the fetch runs
    pub fetch_depends_on: Vec<String>,
}

impl IamPatch {
    /// Run the fetch only after `name` has been applied
    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.fetch_depends_on.push(name.into());
        self
    }

    /// The fetch and patch resources, in that order
    pub fn into_resources(self) -> [Resource; 2] {
        let mut fetch = Resource::action(
            &self.fetch_name,
            types::GET_IAM_POLICY,
            json!({ "resource": self.resource }),
        )
        .with_runtime_policy(RuntimePolicy::UpdateAlways);
        fetch.depends_on = self.fetch_depends_on;

        let patch = match self.change {
            PolicyChange::Bindings { add, remove } => {
                let mut diff = json!({ "add": add });
                if !remove.is_empty() {
                    diff["remove"] = json!(remove);
                }
                // The engine orders the patch after the fetch through the
                // whole-policy reference.
                Resource::action(
                    &self.patch_name,
                    types::SET_IAM_POLICY,
                    json!({
                        "resource": self.resource,
                        "policy": self.etag_reference,
                        "gcpIamPolicyPatch": diff,
                    }),
                )
            }
            PolicyChange::AuditConfigs(configs) => Resource::action(
                &self.patch_name,
                types::SET_IAM_POLICY,
                json!({
                    "updateMask": "auditConfigs,etag",
                    "resource": self.resource,
                    "policy": {
                        "auditConfigs": configs,
                        "etag": self.etag_reference,
                    },
                }),
            )
            .depends_on(self.fetch_name.clone()),
        }
        .with_runtime_policy(RuntimePolicy::UpdateOnChange);

        [fetch, patch]
    }
}

/// Builds fetch/patch pairs for one project
pub struct IamPolicyPatchBuilder {
    resource: String,
}

impl IamPolicyPatchBuilder {
    pub fn new(project_id: &str) -> Self {
        Self {
            resource: project_id.to_string(),
        }
    }

    /// Binding diff pair named `<prefix>-get-iam-policy` / `<prefix>-patch-iam-policy`
    pub fn bindings(&self, prefix: &str, add: Vec<Binding>, remove: Vec<Binding>) -> IamPatch {
        let fetch_name = names::fetch_name(prefix);
        IamPatch {
            resource: self.resource.clone(),
            etag_reference: format!("$(ref.{})", fetch_name),
            patch_name: names::patch_name(prefix),
            fetch_name,
            change: PolicyChange::Bindings { add, remove },
            fetch_depends_on: Vec::new(),
        }
    }

    /// Audit config pair restricted to the `auditConfigs` field
    pub fn audit_configs(
        &self,
        fetch_name: &str,
        patch_name: &str,
        configs: Vec<AuditConfig>,
    ) -> IamPatch {
        IamPatch {
            resource: self.resource.clone(),
            fetch_name: fetch_name.to_string(),
            patch_name: patch_name.to_string(),
            etag_reference: format!("$(ref.{}.etag)", fetch_name),
            change: PolicyChange::AuditConfigs(configs),
            fetch_depends_on: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_patch_pair() {
        let builder = IamPolicyPatchBuilder::new("my-project");
        let add = vec![Binding::new("roles/editor", vec!["group:e@x".to_string()])];
        let [fetch, patch] = builder
            .bindings(names::PROJECT_BINDINGS, add, Vec::new())
            .into_resources();

        assert_eq!(fetch.name, "set-project-bindings-get-iam-policy");
        assert_eq!(fetch.runtime_policy, Some(RuntimePolicy::UpdateAlways));
        assert!(fetch.depends_on.is_empty());

        assert_eq!(patch.runtime_policy, Some(RuntimePolicy::UpdateOnChange));
        assert_eq!(
            patch.properties,
            json!({
                "resource": "my-project",
                "policy": "$(ref.set-project-bindings-get-iam-policy)",
                "gcpIamPolicyPatch": {
                    "add": [{"role": "roles/editor", "members": ["group:e@x"]}]
                }
            })
        );
    }

    #[test]
    fn test_binding_patch_carries_remove_list() {
        let builder = IamPolicyPatchBuilder::new("my-project");
        let add = vec![
            Binding::new("roles/owner", vec!["group:a@x".to_string()]),
            Binding::new("roles/viewer", vec!["user:v@x".to_string()]),
        ];
        let remove = vec![Binding::new("roles/owner", vec!["user:old@x".to_string()])];
        let [_, patch] = builder
            .bindings(names::PROJECT_BINDINGS, add, remove)
            .into_resources();

        assert_eq!(
            patch.properties["gcpIamPolicyPatch"],
            json!({
                "add": [
                    {"role": "roles/owner", "members": ["group:a@x"]},
                    {"role": "roles/viewer", "members": ["user:v@x"]},
                ],
                "remove": [{"role": "roles/owner", "members": ["user:old@x"]}],
            })
        );
    }

    #[test]
    fn test_patch_references_fetch_not_literal_etag() {
        let builder = IamPolicyPatchBuilder::new("p");
        let patch = builder.audit_configs("f", "pp", vec![AuditConfig::all_services()]);
        assert_eq!(patch.etag_reference, "$(ref.f.etag)");
        assert!(patch.etag_reference.contains(&patch.fetch_name));

        let patch = builder.bindings("x", Vec::new(), Vec::new());
        assert_eq!(patch.etag_reference, format!("$(ref.{})", patch.fetch_name));
    }

    #[test]
    fn test_audit_config_pair() {
        let builder = IamPolicyPatchBuilder::new("my-project");
        let [fetch, patch] = builder
            .audit_configs(
                names::AUDIT_CONFIGS_FETCH,
                names::AUDIT_CONFIGS_PATCH,
                vec![AuditConfig::all_services()],
            )
            .after("earlier")
            .into_resources();

        assert_eq!(fetch.depends_on, vec!["earlier"]);
        assert_eq!(patch.depends_on, vec![names::AUDIT_CONFIGS_FETCH]);
        assert_eq!(
            patch.properties["policy"],
            json!({
                "auditConfigs": [{
                    "auditLogConfigs": [
                        {"logType": "ADMIN_READ"},
                        {"logType": "DATA_WRITE"},
                        {"logType": "DATA_READ"},
                    ],
                    "service": "allServices",
                }],
                "etag": "$(ref.audit-configs-get-iam-etag.etag)",
            })
        );
    }
}

//! Role bindings
//!
//! Bindings keep the order in which roles and members are first seen, since
//! the emitted documents are compared for exact equality downstream.

use super::dataset_access::{AccessEntry, Grantee, DATASET_ACCESS_ALIASES};
use crate::error::{CompileError, Result};
use crate::spec::{AliasPermissions, NormalizedBucket, NormalizedDataset, NormalizedSpec, PubSub};
use serde::{Deserialize, Serialize};

/// Bucket role aliases and the storage role each one grants, in emission order
pub const BUCKET_ROLE_ALIASES: &[(&str, &str)] = &[
    ("owners", "roles/storage.admin"),
    ("readwrite", "roles/storage.objectAdmin"),
    ("readonly", "roles/storage.objectViewer"),
    ("writeonly", "roles/storage.objectCreator"),
];

/// Cloud Storage writes bucket access logs as this group
const STORAGE_ANALYTICS_GROUP: &str = "group:cloud-storage-analytics@google.com";

const PROJECT_OWNER_ROLE: &str = "roles/owner";
const PROJECT_IAM_ADMIN_ROLE: &str = "roles/resourcemanager.projectIamAdmin";
const PROJECT_AUDITOR_ROLE: &str = "roles/iam.securityReviewer";
const PROJECT_EDITOR_ROLE: &str = "roles/editor";

const PUBSUB_PUBLISHER_ROLE: &str = "roles/pubsub.publisher";
const PUBSUB_EDITOR_ROLE: &str = "roles/pubsub.editor";

/// One role granted to an ordered, duplicate-free list of members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    pub members: Vec<String>,
}

impl Binding {
    pub fn new(role: &str, members: Vec<String>) -> Self {
        Self {
            role: role.to_string(),
            members,
        }
    }
}

/// Bindings keyed by role, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    bindings: Vec<Binding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `role` to `members`, appending to an existing binding for the role.
    /// Members already present are skipped.
    pub fn grant<I, S>(&mut self, role: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idx = match self.bindings.iter().position(|b| b.role == role) {
            Some(idx) => idx,
            None => {
                self.bindings.push(Binding::new(role, Vec::new()));
                self.bindings.len() - 1
            }
        };
        let binding = &mut self.bindings[idx];
        for member in members {
            let member = member.into();
            if !binding.members.contains(&member) {
                binding.members.push(member);
            }
        }
    }

    pub fn get(&self, role: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.role == role)
    }

    /// Bindings in first-seen role order, without memberless roles
    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
            .into_iter()
            .filter(|b| !b.members.is_empty())
            .collect()
    }

    /// Bindings ordered by role name, without memberless roles
    pub fn into_sorted_bindings(self) -> Vec<Binding> {
        let mut bindings = self.into_bindings();
        bindings.sort_by(|a, b| a.role.cmp(&b.role));
        bindings
    }
}

/// Project-level binding diff
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectBindings {
    pub add: Vec<Binding>,
    pub remove: Vec<Binding>,
}

/// Derives bindings for each resource class from the spec's groups
pub struct RoleBindingAggregator<'a> {
    spec: &'a NormalizedSpec,
}

impl<'a> RoleBindingAggregator<'a> {
    pub fn new(spec: &'a NormalizedSpec) -> Self {
        Self { spec }
    }

    fn owners(&self) -> Vec<String> {
        vec![group(&self.spec.owners_group)]
    }

    fn readwrite(&self) -> Vec<String> {
        self.spec.readwrite_groups.iter().map(|g| group(g)).collect()
    }

    fn readonly(&self) -> Vec<String> {
        self.spec.readonly_groups.iter().map(|g| group(g)).collect()
    }

    /// Default members for a bucket alias
    fn bucket_defaults(&self, alias: &str) -> Vec<String> {
        match alias {
            "owners" => self.owners(),
            "readwrite" => self.readwrite(),
            "readonly" => self.readonly(),
            _ => Vec::new(),
        }
    }

    /// Data bucket bindings: defaults first, then the bucket's own additions
    pub fn bucket_bindings(&self, bucket: &NormalizedBucket) -> Vec<Binding> {
        let defaults: Vec<(&str, Vec<String>)> = BUCKET_ROLE_ALIASES
            .iter()
            .map(|(alias, role)| (*role, self.bucket_defaults(alias)))
            .collect();
        aggregate(&defaults, &alias_grants(&bucket.additional_permissions))
    }

    /// Bindings of the local audit logs bucket
    pub fn logs_bucket_bindings(&self) -> Vec<Binding> {
        let defaults = [
            ("roles/storage.admin", self.owners()),
            ("roles/storage.objectViewer", vec![group(&self.spec.auditors_group)]),
            (
                "roles/storage.objectCreator",
                vec![STORAGE_ANALYTICS_GROUP.to_string()],
            ),
        ];
        aggregate(&defaults, &[])
    }

    /// Project-level bindings to add and remove, ordered by role
    pub fn project_bindings(&self) -> ProjectBindings {
        let owner_role = if self.spec.has_organization {
            PROJECT_OWNER_ROLE
        } else {
            PROJECT_IAM_ADMIN_ROLE
        };

        let mut set = BindingSet::new();
        set.grant(owner_role, self.owners());
        set.grant(PROJECT_AUDITOR_ROLE, [group(&self.spec.auditors_group)]);
        if let Some(editors) = &self.spec.editors_group {
            set.grant(PROJECT_EDITOR_ROLE, [group(editors)]);
        }
        for permission in &self.spec.additional_project_permissions {
            for role in &permission.roles {
                set.grant(role, permission.members.iter().cloned());
            }
        }

        let mut removals = BindingSet::new();
        if let Some(user) = &self.spec.remove_owner_user {
            removals.grant(PROJECT_OWNER_ROLE, [format!("user:{}", user)]);
        }

        ProjectBindings {
            add: set.into_sorted_bindings(),
            remove: removals.into_bindings(),
        }
    }

    /// Dataset access entries: defaults first, then the dataset's own additions
    pub fn dataset_access(&self, dataset: &NormalizedDataset) -> Result<Vec<AccessEntry>> {
        let mut entries: Vec<AccessEntry> = Vec::new();
        let mut push = |entry: AccessEntry| {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        };

        push(AccessEntry::new(
            "OWNER",
            Grantee::GroupByEmail(self.spec.owners_group.clone()),
        ));
        for g in &self.spec.readonly_groups {
            push(AccessEntry::new("READER", Grantee::GroupByEmail(g.clone())));
        }
        for g in &self.spec.readwrite_groups {
            push(AccessEntry::new("WRITER", Grantee::GroupByEmail(g.clone())));
        }

        for (alias, role) in DATASET_ACCESS_ALIASES {
            let Some(members) = dataset.additional_permissions.get(*alias) else {
                continue;
            };
            for member in members {
                let grantee = Grantee::from_member(member).ok_or_else(|| {
                    CompileError::config(format!(
                        "{}: unsupported dataset member {:?}",
                        dataset.name, member
                    ))
                })?;
                push(AccessEntry::new(role, grantee));
            }
        }

        Ok(entries)
    }

    pub fn topic_bindings(&self, pubsub: &PubSub) -> Vec<Binding> {
        let publisher = format!("serviceAccount:{}", pubsub.publisher_account);
        aggregate(&[(PUBSUB_PUBLISHER_ROLE, vec![publisher])], &[])
    }

    pub fn subscription_bindings(&self) -> Vec<Binding> {
        aggregate(&[(PUBSUB_EDITOR_ROLE, self.readwrite())], &[])
    }
}

/// Merge `additional` grants into the `defaults`, keeping default role order
/// and appending unseen roles in first-seen order.
pub fn aggregate(
    defaults: &[(&str, Vec<String>)],
    additional: &[(&str, &[String])],
) -> Vec<Binding> {
    let mut set = BindingSet::new();
    for (role, members) in defaults {
        set.grant(role, members.iter().cloned());
    }
    for (role, members) in additional {
        set.grant(role, members.iter().cloned());
    }
    set.into_bindings()
}

/// Bucket alias permissions as `(role, members)` in alias emission order
fn alias_grants(permissions: &AliasPermissions) -> Vec<(&'static str, &[String])> {
    BUCKET_ROLE_ALIASES
        .iter()
        .filter_map(|(alias, role)| {
            permissions
                .get(*alias)
                .map(|members| (*role, members.as_slice()))
        })
        .collect()
}

fn group(email: &str) -> String {
    format!("group:{}", email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{normalize, AdditionalPermission, ProjectSpec, StorageBucket};

    fn spec() -> ProjectSpec {
        ProjectSpec {
            project_id: Some("my-project".to_string()),
            owners_group: Some("owners@x.com".to_string()),
            auditors_group: Some("auditors@x.com".to_string()),
            data_readwrite_groups: vec!["rw@x.com".to_string()],
            data_readonly_groups: vec!["ro@x.com".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_binding_set_dedups_and_keeps_order() {
        let mut set = BindingSet::new();
        set.grant("roles/b", ["m1", "m2"]);
        set.grant("roles/a", ["m3"]);
        set.grant("roles/b", ["m2", "m4"]);
        set.grant("roles/empty", Vec::<String>::new());
        assert_eq!(set.get("roles/b").unwrap().members, vec!["m1", "m2", "m4"]);
        let bindings = set.clone().into_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].role, "roles/b");
        assert_eq!(bindings[1].role, "roles/a");

        let sorted = set.into_sorted_bindings();
        assert_eq!(sorted[0].role, "roles/a");
    }

    #[test]
    fn test_bucket_binding_merge() {
        let mut spec = spec();
        spec.data_buckets.push(StorageBucket {
            name: "my-bucket".to_string(),
            location: "US".to_string(),
            additional_bucket_permissions: Some(
                [(
                    "readwrite".to_string(),
                    vec!["group:g2@x.com".to_string(), "group:rw@x.com".to_string()],
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        });
        let normalized = normalize(&spec, None).unwrap();
        let bindings =
            RoleBindingAggregator::new(&normalized).bucket_bindings(&normalized.buckets[0]);

        let object_admin: Vec<&Binding> = bindings
            .iter()
            .filter(|b| b.role == "roles/storage.objectAdmin")
            .collect();
        assert_eq!(object_admin.len(), 1);
        assert_eq!(object_admin[0].members, vec!["group:rw@x.com", "group:g2@x.com"]);
        // writeonly has no members, so no objectCreator binding
        assert!(bindings.iter().all(|b| b.role != "roles/storage.objectCreator"));
        assert_eq!(bindings[0].role, "roles/storage.admin");
    }

    #[test]
    fn test_same_member_in_different_roles_kept() {
        let mut spec = spec();
        spec.data_buckets.push(StorageBucket {
            name: "my-bucket".to_string(),
            location: "US".to_string(),
            additional_bucket_permissions: Some(
                [("owners".to_string(), vec!["group:ro@x.com".to_string()])]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        });
        let normalized = normalize(&spec, None).unwrap();
        let bindings =
            RoleBindingAggregator::new(&normalized).bucket_bindings(&normalized.buckets[0]);
        let holding: Vec<&str> = bindings
            .iter()
            .filter(|b| b.members.contains(&"group:ro@x.com".to_string()))
            .map(|b| b.role.as_str())
            .collect();
        assert_eq!(holding, vec!["roles/storage.admin", "roles/storage.objectViewer"]);
    }

    #[test]
    fn test_project_bindings_without_org() {
        let mut spec = spec();
        spec.editors_group = Some("editors@x.com".to_string());
        spec.additional_project_permissions.push(AdditionalPermission {
            roles: vec!["roles/editor".to_string()],
            members: vec!["serviceAccount:sa@x.com".to_string()],
        });
        let normalized = normalize(&spec, None).unwrap();
        let project = RoleBindingAggregator::new(&normalized).project_bindings();
        let roles: Vec<&str> = project.add.iter().map(|b| b.role.as_str()).collect();
        assert_eq!(
            roles,
            vec![
                "roles/editor",
                "roles/iam.securityReviewer",
                "roles/resourcemanager.projectIamAdmin"
            ]
        );
        assert_eq!(
            project.add[0].members,
            vec!["group:editors@x.com", "serviceAccount:sa@x.com"]
        );
        assert!(project.remove.is_empty());
    }

    #[test]
    fn test_project_bindings_with_org_and_removal() {
        let mut spec = spec();
        spec.has_organization = true;
        spec.remove_owner_user = Some("boot@x.com".to_string());
        let normalized = normalize(&spec, None).unwrap();
        let project = RoleBindingAggregator::new(&normalized).project_bindings();
        assert_eq!(
            project.add[1],
            Binding::new("roles/owner", vec!["group:owners@x.com".to_string()])
        );
        assert_eq!(
            project.remove,
            vec![Binding::new("roles/owner", vec!["user:boot@x.com".to_string()])]
        );
    }

    #[test]
    fn test_logs_bucket_bindings() {
        let normalized = normalize(&spec(), None).unwrap();
        let bindings = RoleBindingAggregator::new(&normalized).logs_bucket_bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[1].members, vec!["group:auditors@x.com"]);
        assert_eq!(bindings[2].members, vec![STORAGE_ANALYTICS_GROUP]);
    }

    #[test]
    fn test_subscription_without_readwrite_groups() {
        let mut spec = spec();
        spec.data_readwrite_groups.clear();
        let normalized = normalize(&spec, None).unwrap();
        assert!(RoleBindingAggregator::new(&normalized)
            .subscription_bindings()
            .is_empty());
    }
}

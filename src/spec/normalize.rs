//! Spec normalization
//!
//! Validates a raw [`ProjectSpec`] and fills in defaults. Nothing downstream
//! re-checks these rules, so anything that would make the compiler emit a
//! broken or ambiguous resource list is rejected here.

use super::{AdditionalPermission, AliasPermissions, CustomRole, ProjectSpec, PubSub};
use crate::error::{CompileError, Result};
use crate::iam::{BUCKET_ROLE_ALIASES, DATASET_ACCESS_ALIASES};
use crate::metrics::MetricPurpose;
use crate::resource::names;
use std::collections::HashSet;

/// Retention for the local audit logs bucket when `ttl_days` is omitted
pub const DEFAULT_LOGS_TTL_DAYS: u32 = 365;

/// Pub/Sub's own default acknowledgement deadline
pub const DEFAULT_ACK_DEADLINE_SEC: u32 = 10;

const MIN_ACK_DEADLINE_SEC: u32 = 10;
const MAX_ACK_DEADLINE_SEC: u32 = 600;

/// Characters with meaning in a Cloud Logging filter expression
const FILTER_METACHARACTERS: &[char] = &['(', ')', '"', '\\', '{', '}', '=', '!', '<', '>', ':'];

/// Cloud Storage classes accepted for buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageClass {
    #[default]
    Standard,
    MultiRegional,
    Regional,
    Nearline,
    Coldline,
    Archive,
    DurableReducedAvailability,
}

impl StorageClass {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STANDARD" => Some(Self::Standard),
            "MULTI_REGIONAL" => Some(Self::MultiRegional),
            "REGIONAL" => Some(Self::Regional),
            "NEARLINE" => Some(Self::Nearline),
            "COLDLINE" => Some(Self::Coldline),
            "ARCHIVE" => Some(Self::Archive),
            "DURABLE_REDUCED_AVAILABILITY" => Some(Self::DurableReducedAvailability),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::MultiRegional => "MULTI_REGIONAL",
            Self::Regional => "REGIONAL",
            Self::Nearline => "NEARLINE",
            Self::Coldline => "COLDLINE",
            Self::Archive => "ARCHIVE",
            Self::DurableReducedAvailability => "DURABLE_REDUCED_AVAILABILITY",
        }
    }
}

/// Validated spec with every default resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpec {
    pub project_id: String,
    pub has_organization: bool,
    pub owners_group: String,
    pub editors_group: Option<String>,
    pub auditors_group: String,
    pub remove_owner_user: Option<String>,
    pub readwrite_groups: Vec<String>,
    pub readonly_groups: Vec<String>,
    pub additional_project_permissions: Vec<AdditionalPermission>,
    /// Title and description are always filled in
    pub custom_roles: Vec<CustomRole>,
    pub datasets: Vec<NormalizedDataset>,
    pub buckets: Vec<NormalizedBucket>,
    pub audit_logs: Option<NormalizedAuditLogs>,
    /// Ack deadline is always filled in
    pub pubsub: Option<PubSub>,
    pub enabled_apis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    pub name: String,
    pub location: String,
    pub additional_permissions: AliasPermissions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBucket {
    pub name: String,
    pub location: String,
    pub storage_class: StorageClass,
    pub additional_permissions: AliasPermissions,
    /// Empty when the bucket has no unexpected-access metric
    pub expected_users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedAuditLogs {
    Local {
        bucket_location: String,
        bucket_storage_class: StorageClass,
        ttl_days: u32,
    },
    Remote {
        project_id: String,
        bucket_name: String,
        dataset_name: String,
    },
}

/// Validate `spec` and fill defaults.
///
/// `project_id` takes precedence over the spec's own `project_id`.
pub fn normalize(spec: &ProjectSpec, project_id: Option<&str>) -> Result<NormalizedSpec> {
    let project_id = project_id
        .map(str::to_string)
        .or_else(|| spec.project_id.clone())
        .ok_or_else(|| CompileError::config("no project id given"))?;
    check_project_id("project_id", &project_id)?;

    let owners_group = required_field("owners_group", &spec.owners_group)?;
    let auditors_group = required_field("auditors_group", &spec.auditors_group)?;
    if let Some(editors) = &spec.editors_group {
        check_identifier("editors_group", editors)?;
    }
    for group in spec
        .data_readwrite_groups
        .iter()
        .chain(&spec.data_readonly_groups)
    {
        check_identifier("data group", group)?;
    }

    for permission in &spec.additional_project_permissions {
        check_project_permission(permission)?;
    }

    if let Some(user) = &spec.remove_owner_user {
        check_identifier("remove_owner_user", user)?;
        let member = format!("user:{}", user);
        let regranted = spec
            .additional_project_permissions
            .iter()
            .any(|p| p.roles.iter().any(|r| r == "roles/owner") && p.members.contains(&member));
        if regranted {
            return Err(CompileError::config(format!(
                "remove_owner_user {} is also granted roles/owner",
                user
            )));
        }
    }

    let custom_roles = spec
        .custom_roles
        .iter()
        .map(normalize_custom_role)
        .collect::<Result<Vec<_>>>()?;

    let datasets = spec
        .bigquery_datasets
        .iter()
        .map(|d| {
            check_dataset_name(&d.name)?;
            check_location(&d.name, &d.location)?;
            let additional = d.additional_dataset_permissions.clone().unwrap_or_default();
            let dataset_aliases: Vec<&str> =
                DATASET_ACCESS_ALIASES.iter().map(|(a, _)| *a).collect();
            check_aliases(&d.name, &additional, &dataset_aliases)?;
            Ok(NormalizedDataset {
                name: d.name.clone(),
                location: d.location.clone(),
                additional_permissions: additional,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let buckets = spec
        .data_buckets
        .iter()
        .map(|b| {
            check_bucket_name(&b.name)?;
            check_location(&b.name, &b.location)?;
            let storage_class = parse_storage_class(&b.name, b.storage_class.as_deref())?;
            let additional = b.additional_bucket_permissions.clone().unwrap_or_default();
            let bucket_aliases: Vec<&str> = BUCKET_ROLE_ALIASES.iter().map(|(a, _)| *a).collect();
            check_aliases(&b.name, &additional, &bucket_aliases)?;
            let expected_users = b.expected_users.clone().unwrap_or_default();
            for user in &expected_users {
                check_filter_user(&b.name, user)?;
            }
            Ok(NormalizedBucket {
                name: b.name.clone(),
                location: b.location.clone(),
                storage_class,
                additional_permissions: additional,
                expected_users,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let audit_logs = normalize_audit_logs(spec)?;
    let pubsub = spec.pubsub.as_ref().map(normalize_pubsub).transpose()?;

    let normalized = NormalizedSpec {
        project_id,
        has_organization: spec.has_organization,
        owners_group,
        editors_group: spec.editors_group.clone(),
        auditors_group,
        remove_owner_user: spec.remove_owner_user.clone(),
        readwrite_groups: spec.data_readwrite_groups.clone(),
        readonly_groups: spec.data_readonly_groups.clone(),
        additional_project_permissions: spec.additional_project_permissions.clone(),
        custom_roles,
        datasets,
        buckets,
        audit_logs,
        pubsub,
        enabled_apis: spec.enabled_apis.clone(),
    };
    check_resource_names(&normalized)?;

    tracing::debug!(
        "Normalized spec for {}: {} datasets, {} buckets, {} custom roles",
        normalized.project_id,
        normalized.datasets.len(),
        normalized.buckets.len(),
        normalized.custom_roles.len()
    );

    Ok(normalized)
}

fn required_field(field: &str, value: &Option<String>) -> Result<String> {
    let Some(value) = value else {
        return Err(CompileError::config(format!("{} is required", field)));
    };
    check_identifier(field, value)?;
    Ok(value.clone())
}

/// Non-empty, no whitespace
fn check_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CompileError::config(format!("{} must not be empty", field)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CompileError::config(format!(
            "{} contains whitespace: {:?}",
            field, value
        )));
    }
    Ok(())
}

/// GCP project ids: 6-30 chars of lowercase letters, digits and hyphens,
/// starting with a letter and not ending with a hyphen
fn check_project_id(field: &str, value: &str) -> Result<()> {
    let valid = (6..=30).contains(&value.len())
        && value.starts_with(|c: char| c.is_ascii_lowercase())
        && !value.ends_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(CompileError::config(format!(
            "{} is not a valid project id: {:?}",
            field, value
        )));
    }
    Ok(())
}

/// Expected users are spliced into a log filter verbatim
fn check_filter_user(bucket: &str, user: &str) -> Result<()> {
    check_identifier("expected_users", user)?;
    if let Some(c) = user.chars().find(|c| FILTER_METACHARACTERS.contains(c)) {
        return Err(CompileError::config(format!(
            "{}: expected user {:?} contains {:?}",
            bucket, user, c
        )));
    }
    Ok(())
}

fn check_project_permission(permission: &AdditionalPermission) -> Result<()> {
    if permission.roles.is_empty() {
        return Err(CompileError::config(
            "additional_project_permissions entry has no roles",
        ));
    }
    for role in &permission.roles {
        check_identifier("additional_project_permissions role", role)?;
    }
    for member in &permission.members {
        check_identifier("additional_project_permissions member", member)?;
    }
    Ok(())
}

fn normalize_custom_role(role: &CustomRole) -> Result<CustomRole> {
    check_identifier("custom role name", &role.name)?;
    if !role
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(CompileError::config(format!(
            "invalid custom role name: {}",
            role.name
        )));
    }
    if role.permissions.is_empty() {
        return Err(CompileError::config(format!(
            "custom role {} has no permissions",
            role.name
        )));
    }
    Ok(CustomRole {
        name: role.name.clone(),
        permissions: role.permissions.clone(),
        title: Some(role.title.clone().unwrap_or_else(|| role.name.clone())),
        description: Some(role.description.clone().unwrap_or_else(|| role.name.clone())),
    })
}

fn check_dataset_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 1024
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(CompileError::config(format!(
            "invalid bigquery dataset name: {:?}",
            name
        )));
    }
    Ok(())
}

fn check_bucket_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let valid_ends = name
        .chars()
        .next()
        .zip(name.chars().last())
        .map(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric())
        .unwrap_or(false);
    if !(3..=63).contains(&name.len()) || !valid_chars || !valid_ends {
        return Err(CompileError::config(format!(
            "invalid storage bucket name: {:?}",
            name
        )));
    }
    Ok(())
}

/// Multi-regions (`US`, `EU`) and regions (`US-CENTRAL1`, `europe-west1`)
fn check_location(owner: &str, location: &str) -> Result<()> {
    let valid = !location.is_empty()
        && location.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !location.starts_with('-')
        && !location.ends_with('-');
    if !valid {
        return Err(CompileError::config(format!(
            "{}: invalid location {:?}",
            owner, location
        )));
    }
    Ok(())
}

fn parse_storage_class(owner: &str, value: Option<&str>) -> Result<StorageClass> {
    match value {
        None => Ok(StorageClass::default()),
        Some(s) => StorageClass::parse(s).ok_or_else(|| {
            CompileError::config(format!("{}: unknown storage class {:?}", owner, s))
        }),
    }
}

fn check_aliases(owner: &str, permissions: &AliasPermissions, known: &[&str]) -> Result<()> {
    for (alias, members) in permissions {
        if !known.contains(&alias.as_str()) {
            return Err(CompileError::config(format!(
                "{}: unknown role alias {:?} (expected one of {})",
                owner,
                alias,
                known.join(", ")
            )));
        }
        for member in members {
            check_identifier(&format!("{} {} member", owner, alias), member)?;
        }
    }
    Ok(())
}

fn normalize_audit_logs(spec: &ProjectSpec) -> Result<Option<NormalizedAuditLogs>> {
    match (&spec.local_audit_logs, &spec.remote_audit_logs) {
        (Some(_), Some(_)) => Err(CompileError::config(
            "local_audit_logs and remote_audit_logs are mutually exclusive",
        )),
        (Some(local), None) => {
            let bucket = &local.logs_gcs_bucket;
            check_location("logs_gcs_bucket", &bucket.location)?;
            // The sink writes into a fixed dataset; its location is only checked.
            check_location("logs_bigquery_dataset", &local.logs_bigquery_dataset.location)?;
            let ttl_days = bucket.ttl_days.unwrap_or(DEFAULT_LOGS_TTL_DAYS);
            if ttl_days == 0 {
                return Err(CompileError::config(
                    "logs_gcs_bucket ttl_days must be positive",
                ));
            }
            Ok(Some(NormalizedAuditLogs::Local {
                bucket_location: bucket.location.clone(),
                bucket_storage_class: parse_storage_class(
                    "logs_gcs_bucket",
                    bucket.storage_class.as_deref(),
                )?,
                ttl_days,
            }))
        }
        (None, Some(remote)) => {
            check_project_id("audit_logs_project_id", &remote.audit_logs_project_id)?;
            check_identifier("logs_gcs_bucket_name", &remote.logs_gcs_bucket_name)?;
            check_identifier("logs_bigquery_dataset_id", &remote.logs_bigquery_dataset_id)?;
            Ok(Some(NormalizedAuditLogs::Remote {
                project_id: remote.audit_logs_project_id.clone(),
                bucket_name: remote.logs_gcs_bucket_name.clone(),
                dataset_name: remote.logs_bigquery_dataset_id.clone(),
            }))
        }
        (None, None) => {
            if !spec.data_buckets.is_empty() || !spec.bigquery_datasets.is_empty() {
                tracing::warn!("No audit logs configured; audit sink will not be generated");
            }
            Ok(None)
        }
    }
}

fn normalize_pubsub(pubsub: &PubSub) -> Result<PubSub> {
    check_identifier("pubsub topic", &pubsub.topic)?;
    check_identifier("pubsub subscription", &pubsub.subscription)?;
    check_identifier("pubsub publisher_account", &pubsub.publisher_account)?;
    let ack_deadline_sec = pubsub.ack_deadline_sec.unwrap_or(DEFAULT_ACK_DEADLINE_SEC);
    if !(MIN_ACK_DEADLINE_SEC..=MAX_ACK_DEADLINE_SEC).contains(&ack_deadline_sec) {
        return Err(CompileError::config(format!(
            "pubsub ack_deadline_sec must be within {}..={}, got {}",
            MIN_ACK_DEADLINE_SEC, MAX_ACK_DEADLINE_SEC, ack_deadline_sec
        )));
    }
    Ok(PubSub {
        ack_deadline_sec: Some(ack_deadline_sec),
        ..pubsub.clone()
    })
}

/// Every resource the builder will emit must get a distinct name.
fn check_resource_names(spec: &NormalizedSpec) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut claim = |name: String| -> Result<()> {
        if seen.insert(name.clone()) {
            Ok(())
        } else {
            Err(CompileError::config(format!(
                "resource name {:?} is used more than once",
                name
            )))
        }
    };

    for role in &spec.custom_roles {
        claim(role.name.clone())?;
    }
    claim(names::fetch_name(names::PROJECT_BINDINGS))?;
    claim(names::patch_name(names::PROJECT_BINDINGS))?;
    if matches!(spec.audit_logs, Some(NormalizedAuditLogs::Local { .. })) {
        claim(names::logs_bucket(&spec.project_id))?;
    }
    if spec.audit_logs.is_some() {
        claim(names::AUDIT_SINK.to_string())?;
    }
    for dataset in &spec.datasets {
        claim(names::dataset_create(&dataset.name))?;
        claim(names::dataset_update(&dataset.name))?;
    }
    for bucket in &spec.buckets {
        claim(bucket.name.clone())?;
        if !bucket.expected_users.is_empty() {
            claim(MetricPurpose::UnexpectedAccess.metric_name(&bucket.name))?;
        }
    }
    if let Some(pubsub) = &spec.pubsub {
        claim(pubsub.topic.clone())?;
        claim(pubsub.subscription.clone())?;
    }
    for purpose in MetricPurpose::FIXED {
        claim(purpose.metric_name(""))?;
    }
    claim(names::AUDIT_CONFIGS_FETCH.to_string())?;
    claim(names::AUDIT_CONFIGS_PATCH.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        BigQueryDataset, LocalAuditLogs, LogsBucket, LogsDataset, RemoteAuditLogs, StorageBucket,
    };

    fn base_spec() -> ProjectSpec {
        ProjectSpec {
            project_id: Some("my-project".to_string()),
            owners_group: Some("admins@example.com".to_string()),
            auditors_group: Some("auditors@example.com".to_string()),
            ..Default::default()
        }
    }

    fn bucket(name: &str) -> StorageBucket {
        StorageBucket {
            name: name.to_string(),
            location: "US".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_filled() {
        let mut spec = base_spec();
        spec.data_buckets.push(bucket("my-bucket"));
        spec.custom_roles.push(CustomRole {
            name: "lister".to_string(),
            permissions: vec!["storage.buckets.list".to_string()],
            ..Default::default()
        });
        spec.pubsub = Some(PubSub {
            topic: "t".to_string(),
            subscription: "s".to_string(),
            publisher_account: "pub@example.com".to_string(),
            ack_deadline_sec: None,
        });

        let normalized = normalize(&spec, None).unwrap();
        assert_eq!(normalized.buckets[0].storage_class, StorageClass::Standard);
        assert!(normalized.buckets[0].expected_users.is_empty());
        assert_eq!(normalized.custom_roles[0].title.as_deref(), Some("lister"));
        assert_eq!(normalized.custom_roles[0].description.as_deref(), Some("lister"));
        assert_eq!(
            normalized.pubsub.unwrap().ack_deadline_sec,
            Some(DEFAULT_ACK_DEADLINE_SEC)
        );
    }

    #[test]
    fn test_project_id_override() {
        let normalized = normalize(&base_spec(), Some("other-project")).unwrap();
        assert_eq!(normalized.project_id, "other-project");

        let mut spec = base_spec();
        spec.project_id = None;
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_owners_group() {
        let mut spec = base_spec();
        spec.owners_group = None;
        let err = normalize(&spec, None).unwrap_err();
        assert_eq!(err, CompileError::config("owners_group is required"));
    }

    #[test]
    fn test_both_audit_blocks_rejected() {
        let mut spec = base_spec();
        spec.local_audit_logs = Some(LocalAuditLogs {
            logs_gcs_bucket: LogsBucket {
                location: "US".to_string(),
                ..Default::default()
            },
            logs_bigquery_dataset: LogsDataset {
                location: "US".to_string(),
            },
        });
        spec.remote_audit_logs = Some(RemoteAuditLogs {
            audit_logs_project_id: "my-audit-logs".to_string(),
            logs_gcs_bucket_name: "b".to_string(),
            logs_bigquery_dataset_id: "d".to_string(),
        });
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_local_audit_ttl_default() {
        let mut spec = base_spec();
        spec.local_audit_logs = Some(LocalAuditLogs {
            logs_gcs_bucket: LogsBucket {
                location: "US".to_string(),
                ..Default::default()
            },
            logs_bigquery_dataset: LogsDataset {
                location: "US".to_string(),
            },
        });
        let normalized = normalize(&spec, None).unwrap();
        match normalized.audit_logs {
            Some(NormalizedAuditLogs::Local { ttl_days, .. }) => {
                assert_eq!(ttl_days, DEFAULT_LOGS_TTL_DAYS)
            }
            other => panic!("expected local audit logs, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_storage_class() {
        let mut spec = base_spec();
        let mut b = bucket("my-bucket");
        b.storage_class = Some("GLACIER".to_string());
        spec.data_buckets.push(b);
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_storage_class_case_insensitive() {
        assert_eq!(StorageClass::parse("regional"), Some(StorageClass::Regional));
        assert_eq!(StorageClass::Regional.as_str(), "REGIONAL");
    }

    #[test]
    fn test_bad_location() {
        let mut spec = base_spec();
        let mut b = bucket("my-bucket");
        b.location = "us central".to_string();
        spec.data_buckets.push(b);
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_alias() {
        let mut spec = base_spec();
        let mut b = bucket("my-bucket");
        b.additional_bucket_permissions = Some(
            [("superusers".to_string(), vec!["user:a@x".to_string()])]
                .into_iter()
                .collect(),
        );
        spec.data_buckets.push(b);
        let err = normalize(&spec, None).unwrap_err();
        assert!(err.to_string().contains("superusers"));

        // writeonly is a bucket alias but not a dataset one
        let mut spec = base_spec();
        spec.bigquery_datasets.push(BigQueryDataset {
            name: "ds".to_string(),
            location: "US".to_string(),
            additional_dataset_permissions: Some(
                [("writeonly".to_string(), vec!["user:a@x".to_string()])]
                    .into_iter()
                    .collect(),
            ),
        });
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut spec = base_spec();
        spec.data_buckets.push(bucket("dup-bucket"));
        spec.data_buckets.push(bucket("dup-bucket"));
        assert!(normalize(&spec, None).unwrap_err().is_configuration());

        let mut spec = base_spec();
        spec.data_buckets.push(bucket("iam-policy-change-count"));
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_ack_deadline_range() {
        let mut spec = base_spec();
        spec.pubsub = Some(PubSub {
            topic: "t".to_string(),
            subscription: "s".to_string(),
            publisher_account: "p@x".to_string(),
            ack_deadline_sec: Some(5),
        });
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_ack_deadline_bounds_accepted() {
        for ack in [MIN_ACK_DEADLINE_SEC, MAX_ACK_DEADLINE_SEC] {
            let mut spec = base_spec();
            spec.pubsub = Some(PubSub {
                topic: "t".to_string(),
                subscription: "s".to_string(),
                publisher_account: "p@x".to_string(),
                ack_deadline_sec: Some(ack),
            });
            let normalized = normalize(&spec, None).unwrap();
            assert_eq!(normalized.pubsub.unwrap().ack_deadline_sec, Some(ack));
        }
    }

    #[test]
    fn test_project_id_grammar() {
        for id in ["my-project", "abcdef", "a1-b2-c3", "abcdefghijklmnopqrstuvwxyz0123"] {
            assert!(normalize(&base_spec(), Some(id)).is_ok(), "{:?} should be accepted", id);
        }
        for id in [
            "evil-{resource}/x",
            "short",
            "1project",
            "my-project-",
            "My-Project",
            "my_project",
            "abcdefghijklmnopqrstuvwxyz01234",
        ] {
            let err = normalize(&base_spec(), Some(id)).unwrap_err();
            assert!(err.is_configuration(), "{:?} should be rejected", id);
        }
    }

    #[test]
    fn test_remote_audit_project_id_grammar() {
        let mut spec = base_spec();
        spec.remote_audit_logs = Some(RemoteAuditLogs {
            audit_logs_project_id: "audit/{project}".to_string(),
            logs_gcs_bucket_name: "b".to_string(),
            logs_bigquery_dataset_id: "d".to_string(),
        });
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_expected_users_reject_filter_metacharacters() {
        for user in ["a@x)", "(a@x", "a\"@x", "a@x AND b", "{allowed_users}", "a!=b"] {
            let mut spec = base_spec();
            let mut b = bucket("data-bucket");
            b.expected_users = Some(vec![user.to_string(), "b@x".to_string()]);
            spec.data_buckets.push(b);
            let err = normalize(&spec, None).unwrap_err();
            assert!(err.is_configuration(), "{:?} should be rejected", user);
        }

        let mut spec = base_spec();
        let mut b = bucket("data-bucket");
        b.expected_users = Some(vec!["auth_user_1@mydomain.com".to_string()]);
        spec.data_buckets.push(b);
        assert!(normalize(&spec, None).is_ok());
    }

    #[test]
    fn test_remove_owner_regranted() {
        let mut spec = base_spec();
        spec.remove_owner_user = Some("boot@example.com".to_string());
        spec.additional_project_permissions.push(AdditionalPermission {
            roles: vec!["roles/owner".to_string()],
            members: vec!["user:boot@example.com".to_string()],
        });
        assert!(normalize(&spec, None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_invalid_bucket_names() {
        for name in ["ab", "-bucket", "Bucket", "bucket-"] {
            let mut spec = base_spec();
            spec.data_buckets.push(bucket(name));
            assert!(
                normalize(&spec, None).is_err(),
                "bucket name {:?} should be rejected",
                name
            );
        }
    }
}

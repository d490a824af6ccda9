//! Resource graph assembly
//!
//! Emits the final resource list in a fixed order. Every dependency edge
//! points at a resource that was already emitted, so the list is a valid
//! topological order by construction; [`validate`] double-checks that.
//!
//! Emission order:
//!
//! 1. custom roles
//! 2. project binding fetch/patch pair
//! 3. local audit logs bucket, audit sink
//! 4. per dataset: create, update (chained across datasets)
//! 5. per bucket: bucket (chained), unexpected-access metric
//! 6. pub/sub topic, subscription
//! 7. project-wide change-count metrics
//! 8. audit config fetch/patch pair

pub mod validate;

use crate::audit::{AuditLoggingResolver, ResolvedAuditLogs};
use crate::error::Result;
use crate::iam::{AuditConfig, IamPolicyPatchBuilder, RoleBindingAggregator};
use crate::metrics::MetricFactory;
use crate::resource::{names, types, Resource, RuntimePolicy};
use crate::spec::{CustomRole, NormalizedSpec, PubSub};
use serde_json::json;

pub struct ResourceGraphBuilder<'a> {
    spec: &'a NormalizedSpec,
    bindings: RoleBindingAggregator<'a>,
    metrics: MetricFactory,
    patches: IamPolicyPatchBuilder,
    resources: Vec<Resource>,
}

impl<'a> ResourceGraphBuilder<'a> {
    pub fn new(spec: &'a NormalizedSpec) -> Self {
        Self {
            spec,
            bindings: RoleBindingAggregator::new(spec),
            metrics: MetricFactory::new(&spec.project_id),
            patches: IamPolicyPatchBuilder::new(&spec.project_id),
            resources: Vec::new(),
        }
    }

    /// Assemble and validate the full resource list
    pub fn build(mut self) -> Result<Vec<Resource>> {
        let audit = AuditLoggingResolver::new(self.spec, &self.bindings).resolve();

        self.add_custom_roles();
        let project_patch = self.add_project_bindings();
        let logs_bucket = self.add_audit_logs(audit);
        self.add_datasets()?;
        self.add_buckets(logs_bucket.as_ref())?;
        self.add_pubsub();
        if !self.spec.buckets.is_empty() || !self.spec.datasets.is_empty() {
            for metric in self.metrics.fixed()? {
                self.push(metric);
            }
        }
        self.add_audit_configs(project_patch);

        validate::check_graph(&self.resources)?;
        tracing::info!(
            "Built {} resources for project {}",
            self.resources.len(),
            self.spec.project_id
        );
        Ok(self.resources)
    }

    fn push(&mut self, resource: Resource) {
        tracing::debug!("Emitting {} ({})", resource.name, resource.type_or_action);
        self.resources.push(resource);
    }

    fn add_custom_roles(&mut self) {
        let spec = self.spec;
        for role in &spec.custom_roles {
            self.push(custom_role(&spec.project_id, role));
        }
    }

    /// Returns the name of the patch resource
    fn add_project_bindings(&mut self) -> String {
        let project = self.bindings.project_bindings();
        let patch = self
            .patches
            .bindings(names::PROJECT_BINDINGS, project.add, project.remove);
        let patch_name = patch.patch_name.clone();
        for resource in patch.into_resources() {
            self.push(resource);
        }
        patch_name
    }

    fn add_audit_logs(&mut self, audit: Option<ResolvedAuditLogs>) -> Option<LogsBucket> {
        let audit = audit?;
        let logs_bucket = LogsBucket {
            name: audit.destination.bucket_name().to_string(),
            resource: audit.logs_bucket_resource().map(str::to_string),
        };
        for resource in audit.into_resources() {
            self.push(resource);
        }
        Some(logs_bucket)
    }

    fn add_datasets(&mut self) -> Result<()> {
        let spec = self.spec;
        let mut previous_update: Option<String> = None;
        for dataset in &spec.datasets {
            let create_name = names::dataset_create(&dataset.name);
            let update_name = names::dataset_update(&dataset.name);

            let mut create = Resource::create(
                &create_name,
                types::BIGQUERY_DATASET,
                json!({
                    "datasetReference": {"datasetId": dataset.name},
                    "location": dataset.location,
                }),
            );
            if let Some(previous) = previous_update.take() {
                create = create.depends_on(previous);
            }

            let access = self.bindings.dataset_access(dataset)?;
            let update = Resource::patch(
                &update_name,
                types::BIGQUERY_DATASET_PATCH,
                json!({
                    "projectId": spec.project_id,
                    "datasetId": dataset.name,
                    "access": access,
                }),
            )
            .depends_on(create_name)
            .with_runtime_policy(RuntimePolicy::UpdateOnChange);

            self.push(create);
            self.push(update);
            previous_update = Some(update_name);
        }
        Ok(())
    }

    fn add_buckets(&mut self, logs_bucket: Option<&LogsBucket>) -> Result<()> {
        let spec = self.spec;
        let mut previous: Option<String> = logs_bucket.and_then(|l| l.resource.clone());
        for bucket in &spec.buckets {
            let mut properties = json!({
                "location": bucket.location,
                "versioning": {"enabled": true},
                "storageClass": bucket.storage_class.as_str(),
            });
            if let Some(logs) = logs_bucket {
                properties["logging"] = json!({"logBucket": logs.name});
            }

            let mut resource = Resource::create(&bucket.name, types::STORAGE_BUCKET, properties)
                .with_bindings(self.bindings.bucket_bindings(bucket));
            if let Some(previous) = previous.take() {
                resource = resource.depends_on(previous);
            }
            self.push(resource);
            previous = Some(bucket.name.clone());

            if !bucket.expected_users.is_empty() {
                let metric = self
                    .metrics
                    .unexpected_access(&bucket.name, &bucket.expected_users)?;
                self.push(metric);
            }
        }
        Ok(())
    }

    fn add_pubsub(&mut self) {
        let spec = self.spec;
        let Some(pubsub) = &spec.pubsub else {
            return;
        };
        let topic = Resource::create(
            &pubsub.topic,
            types::PUBSUB_TOPIC,
            json!({ "topic": pubsub.topic }),
        )
        .with_bindings(self.bindings.topic_bindings(pubsub));
        let subscription = subscription(&spec.project_id, pubsub)
            .with_bindings(self.bindings.subscription_bindings())
            .depends_on(pubsub.topic.clone());
        self.push(topic);
        self.push(subscription);
    }

    fn add_audit_configs(&mut self, project_patch: String) {
        let patch = self
            .patches
            .audit_configs(
                names::AUDIT_CONFIGS_FETCH,
                names::AUDIT_CONFIGS_PATCH,
                vec![AuditConfig::all_services()],
            )
            .after(project_patch);
        for resource in patch.into_resources() {
            self.push(resource);
        }
    }
}

/// Audit logs bucket as seen by data buckets
struct LogsBucket {
    /// Bucket receiving access logs
    name: String,
    /// Resource to wait for; `None` when the bucket lives in another project
    resource: Option<String>,
}

fn custom_role(project_id: &str, role: &CustomRole) -> Resource {
    Resource::create(
        &role.name,
        types::CUSTOM_ROLE,
        json!({
            "parent": format!("projects/{}", project_id),
            "roleId": role.name,
            "role": {
                "title": role.title.as_deref().unwrap_or(&role.name),
                "description": role.description.as_deref().unwrap_or(&role.name),
                "stage": "GA",
                "includedPermissions": role.permissions,
            },
        }),
    )
}

fn subscription(project_id: &str, pubsub: &PubSub) -> Resource {
    Resource::create(
        &pubsub.subscription,
        types::PUBSUB_SUBSCRIPTION,
        json!({
            "subscription": pubsub.subscription,
            "topic": format!("projects/{}/topics/{}", project_id, pubsub.topic),
            "ackDeadlineSeconds": pubsub.ack_deadline_sec,
        }),
    )
}

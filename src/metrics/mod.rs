//! Log-based metrics
//!
//! Renders `logging.v2.metric` resources from the embedded [`catalog`].

pub mod catalog;

use crate::error::{CompileError, Result};
use crate::resource::{types, Resource};
use serde_json::json;

/// What a metric counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPurpose {
    /// Data access to a bucket by anyone outside its expected users
    UnexpectedAccess,
    IamChange,
    BucketPermissionChange,
    BigquerySettingsChange,
}

impl MetricPurpose {
    /// Project-wide metrics, in emission order
    pub const FIXED: [MetricPurpose; 3] = [
        MetricPurpose::IamChange,
        MetricPurpose::BucketPermissionChange,
        MetricPurpose::BigquerySettingsChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnexpectedAccess => "unexpected_access",
            Self::IamChange => "iam_change",
            Self::BucketPermissionChange => "bucket_permission_change",
            Self::BigquerySettingsChange => "bigquery_settings_change",
        }
    }

    /// Name of the metric for `resource`. Fixed metrics ignore `resource`.
    pub fn metric_name(&self, resource: &str) -> String {
        catalog::get_template(self.as_str())
            .and_then(|t| fill(&t.name, &[("resource", resource)]).ok())
            .unwrap_or_else(|| format!("{}-{}", self.as_str(), resource))
    }
}

/// Renders metric resources for one project
pub struct MetricFactory {
    project_id: String,
}

impl MetricFactory {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
        }
    }

    /// Render the metric for `purpose` on `resource`.
    ///
    /// `allowed_users` only applies to [`MetricPurpose::UnexpectedAccess`]
    /// and must not be empty there.
    pub fn render(
        &self,
        purpose: MetricPurpose,
        resource: &str,
        allowed_users: &[String],
    ) -> Result<Resource> {
        let catalog = catalog::get_catalog();
        let template = catalog::get_template(purpose.as_str()).ok_or_else(|| {
            CompileError::invariant(format!("no metric template for {}", purpose.as_str()))
        })?;
        if purpose == MetricPurpose::UnexpectedAccess && allowed_users.is_empty() {
            return Err(CompileError::invariant(format!(
                "unexpected access metric for {} has no allowed users",
                resource
            )));
        }

        let users = allowed_users.join(" AND ");
        let values = [
            ("project", self.project_id.as_str()),
            ("resource", resource),
            ("allowed_users", users.as_str()),
        ];
        let name = fill(&template.name, &values)?;
        tracing::debug!("Rendering metric {}", name);

        Ok(Resource::create(
            &name,
            types::LOGGING_METRIC,
            json!({
                "filter": fill(&template.filter, &values)?,
                "description": fill(&template.description, &values)?,
                "labelExtractors": catalog.label_extractors,
                "metricDescriptor": catalog.metric_descriptor,
                "metric": name,
            }),
        ))
    }

    /// Unexpected-access metric for a bucket
    pub fn unexpected_access(&self, bucket: &str, allowed_users: &[String]) -> Result<Resource> {
        self.render(MetricPurpose::UnexpectedAccess, bucket, allowed_users)
    }

    /// The project-wide change-count metrics, in emission order
    pub fn fixed(&self) -> Result<Vec<Resource>> {
        MetricPurpose::FIXED
            .iter()
            .map(|&purpose| self.render(purpose, "", &[]))
            .collect()
    }
}

/// Replace `{key}` placeholders in one pass. Substituted text is never
/// rescanned, so values containing braces come through literally.
fn fill(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            CompileError::invariant(format!("unterminated placeholder in {:?}", template))
        })?;
        let key = &after[..end];
        let value = values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                CompileError::invariant(format!(
                    "unknown placeholder {{{}}} in {:?}",
                    key, template
                ))
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

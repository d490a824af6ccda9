//! dataproj - compile a declarative project spec into provisioning resources
//!
//! A project spec names the groups that own, read and write a project's data
//! and lists its datasets, buckets, audit log destination and pub/sub pair.
//! Compiling it yields an ordered list of resource declarations for the
//! provisioning engine, including IAM bindings, audit sinks, log-based
//! metrics and read-modify-write patches of the project IAM policy.
//!
//! # Module Structure
//!
//! - [`spec`] - Input schema and normalization
//! - [`iam`] - Role bindings, dataset access entries and IAM policy patches
//! - [`audit`] - Audit log destination resolution
//! - [`metrics`] - Log-based metric rendering
//! - [`graph`] - Ordered resource list assembly
//! - [`resource`] - Output records and their document form
//! - [`error`] - Error taxonomy
//!
//! # Example
//!
//! ```ignore
//! let spec: ProjectSpec = serde_yaml::from_str(&text)?;
//! let deployment = dataproj::compile_deployment(&spec, Some("my-project"))?;
//! println!("{}", serde_yaml::to_string(&deployment)?);
//! ```

pub mod audit;
pub mod error;
pub mod graph;
pub mod iam;
pub mod metrics;
pub mod resource;
pub mod spec;

pub use error::{CompileError, Result};
pub use resource::{Deployment, Resource};
pub use spec::ProjectSpec;

/// Compile `spec` into its ordered resource list.
///
/// `project_id` overrides the spec's own `project_id`. Validation happens
/// up front; on error nothing is returned.
pub fn compile(spec: &ProjectSpec, project_id: Option<&str>) -> Result<Vec<Resource>> {
    let normalized = spec::normalize(spec, project_id)?;
    if !normalized.enabled_apis.is_empty() {
        tracing::debug!("Enabled APIs (informational): {:?}", normalized.enabled_apis);
    }
    graph::ResourceGraphBuilder::new(&normalized).build()
}

/// Compile `spec` and wrap the result as a deployment document
pub fn compile_deployment(spec: &ProjectSpec, project_id: Option<&str>) -> Result<Deployment> {
    compile(spec, project_id).map(Deployment::new)
}

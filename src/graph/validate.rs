//! Structural checks on an emitted resource list

use crate::error::{CompileError, Result};
use crate::resource::Resource;
use std::collections::HashSet;

/// Names must be unique and every `dependsOn` entry must name a resource
/// emitted earlier in the list.
pub fn check_graph(resources: &[Resource]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(resources.len());
    for resource in resources {
        for dependency in &resource.depends_on {
            if !seen.contains(dependency.as_str()) {
                return Err(CompileError::invariant(format!(
                    "{} depends on {} which is not emitted before it",
                    resource.name, dependency
                )));
            }
        }
        if !seen.insert(&resource.name) {
            return Err(CompileError::invariant(format!(
                "duplicate resource name {}",
                resource.name
            )));
        }
    }
    Ok(())
}

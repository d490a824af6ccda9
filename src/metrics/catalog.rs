//! Metric Catalog - Load log-based metric templates from JSON
//!
//! Filter expressions are consumed verbatim by the alerting pipeline, so they
//! live in an embedded JSON file instead of being assembled in code.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded metric catalog (compiled into the binary)
const CATALOG_FILE: &str = include_str!("../resources/metrics.json");

/// Template for one metric purpose.
///
/// Placeholders: `{project}`, `{resource}`, `{allowed_users}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricTemplate {
    pub name: String,
    pub description: String,
    pub filter: String,
}

/// Root structure of resources/metrics.json
#[derive(Debug, Clone, Deserialize)]
pub struct MetricCatalog {
    /// Shared by every metric
    pub label_extractors: Value,
    /// Shared by every metric
    pub metric_descriptor: Value,
    pub metrics: HashMap<String, MetricTemplate>,
}

static CATALOG: OnceLock<MetricCatalog> = OnceLock::new();

/// Get the metric catalog (parses the embedded JSON on first access)
pub fn get_catalog() -> &'static MetricCatalog {
    CATALOG.get_or_init(|| {
        serde_json::from_str(CATALOG_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded metric catalog: {}", e))
    })
}

/// Get a metric template by purpose key
pub fn get_template(key: &str) -> Option<&'static MetricTemplate> {
    get_catalog().metrics.get(key)
}

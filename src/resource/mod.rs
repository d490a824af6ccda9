//! Resource declarations
//!
//! The compiler's output: an ordered list of [`Resource`] records, each of
//! which serializes to a Deployment Manager resource document
//! (`name`, `type` or `action`, `properties`, `accessControl`, `metadata`).
//!
//! # Module Structure
//!
//! - [`names`] - Resource names shared by the normalizer and the builder
//! - [`types`] - Fixed `type` / `action` identifiers of the provisioning engine
//!
//! # Example
//!
//! ```ignore
//! use dataproj::resource::{types, Resource};
//! use serde_json::json;
//!
//! let topic = Resource::create("my-topic", types::PUBSUB_TOPIC, json!({"topic": "my-topic"}));
//! let yaml = serde_yaml::to_string(&topic)?;
//! ```

pub mod names;
pub mod types;

use crate::iam::Binding;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// How the provisioning engine treats the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A typed resource the engine creates and owns
    Create,
    /// An action that mutates an existing resource in place
    Patch,
    /// An arbitrary API call
    Action,
}

impl ResourceKind {
    /// Document key carrying the type or action identifier
    pub fn key(&self) -> &'static str {
        match self {
            Self::Create => "type",
            Self::Patch | Self::Action => "action",
        }
    }
}

/// When the engine re-runs an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimePolicy {
    UpdateAlways,
    UpdateOnChange,
}

/// One resource declaration handed to the provisioning engine
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
    pub type_or_action: String,
    pub properties: Value,
    /// Emitted as `accessControl.gcpIamPolicy.bindings` when non-empty
    pub access_control: Vec<Binding>,
    pub depends_on: Vec<String>,
    pub runtime_policy: Option<RuntimePolicy>,
}

impl Resource {
    fn new(name: &str, kind: ResourceKind, type_or_action: &str, properties: Value) -> Self {
        Self {
            name: name.to_string(),
            kind,
            type_or_action: type_or_action.to_string(),
            properties,
            access_control: Vec::new(),
            depends_on: Vec::new(),
            runtime_policy: None,
        }
    }

    pub fn create(name: &str, type_name: &str, properties: Value) -> Self {
        Self::new(name, ResourceKind::Create, type_name, properties)
    }

    pub fn patch(name: &str, action: &str, properties: Value) -> Self {
        Self::new(name, ResourceKind::Patch, action, properties)
    }

    pub fn action(name: &str, action: &str, properties: Value) -> Self {
        Self::new(name, ResourceKind::Action, action, properties)
    }

    pub fn with_bindings(mut self, bindings: Vec<Binding>) -> Self {
        self.access_control = bindings;
        self
    }

    /// Add a dependency edge to an already emitted resource
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_runtime_policy(mut self, policy: RuntimePolicy) -> Self {
        self.runtime_policy = Some(policy);
        self
    }

    /// Render as a JSON document
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[derive(Serialize)]
struct AccessControl<'a> {
    #[serde(rename = "gcpIamPolicy")]
    policy: GcpIamPolicy<'a>,
}

#[derive(Serialize)]
struct GcpIamPolicy<'a> {
    bindings: &'a [Binding],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    depends_on: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    runtime_policy: Option<[RuntimePolicy; 1]>,
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(self.kind.key(), &self.type_or_action)?;
        map.serialize_entry("properties", &self.properties)?;
        if !self.access_control.is_empty() {
            map.serialize_entry(
                "accessControl",
                &AccessControl {
                    policy: GcpIamPolicy {
                        bindings: &self.access_control,
                    },
                },
            )?;
        }
        if !self.depends_on.is_empty() || self.runtime_policy.is_some() {
            map.serialize_entry(
                "metadata",
                &Metadata {
                    depends_on: (!self.depends_on.is_empty()).then_some(&self.depends_on[..]),
                    runtime_policy: self.runtime_policy.map(|p| [p]),
                },
            )?;
        }
        map.end()
    }
}

/// Template import listed at the top of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Import {
    pub path: String,
}

/// A complete deployment document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,
    pub resources: Vec<Resource>,
}

impl Deployment {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            imports: Vec::new(),
            resources,
        }
    }

    pub fn with_imports(mut self, imports: Vec<Import>) -> Self {
        self.imports = imports;
        self
    }

    /// Look up a resource by name
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resource names in emission order
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}
